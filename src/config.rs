//! Server configuration from command-line arguments and the environment.

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use std::time::Duration;

pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// GitHub repository through the contents API
    Github,
    /// Process memory; contents are lost on exit
    Memory,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "songboard-server")]
#[command(about = "Song suggestion board backed by flat files in a GitHub repository", long_about = None)]
#[command(version)]
pub struct ServerArgs {
    /// Port to listen on
    #[arg(short, long, default_value = "3000", env = "SONGBOARD_PORT")]
    pub port: u16,

    /// Where the data files live
    #[arg(long, value_enum, default_value = "github", env = "SONGBOARD_STORE")]
    pub store: StoreKind,

    #[arg(long, env = "GITHUB_OWNER")]
    pub github_owner: Option<String>,

    #[arg(long, env = "GITHUB_REPO")]
    pub github_repo: Option<String>,

    #[arg(long, default_value = "main", env = "GITHUB_BRANCH")]
    pub github_branch: String,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    #[arg(long, default_value = DEFAULT_GITHUB_API, env = "GITHUB_API_URL")]
    pub github_api_url: String,

    /// How long a loaded collection is served from memory
    #[arg(long, default_value = "300", env = "SONGBOARD_CACHE_TTL_SECS")]
    pub cache_ttl_secs: u64,

    /// Upper bound for each request to the file store
    #[arg(long, default_value = "15", env = "SONGBOARD_HTTP_TIMEOUT_SECS")]
    pub http_timeout_secs: u64,
}

/// Repository coordinates for the GitHub file store.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub api_url: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl ServerArgs {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn github_config(&self) -> Result<GitHubConfig> {
        let (Some(owner), Some(repo)) = (&self.github_owner, &self.github_repo) else {
            bail!("GITHUB_OWNER and GITHUB_REPO are required when the store is github");
        };

        if self.http_timeout_secs == 0 {
            bail!("HTTP timeout must be at least one second");
        }

        Ok(GitHubConfig {
            api_url: self.github_api_url.clone(),
            owner: owner.clone(),
            repo: repo.clone(),
            branch: self.github_branch.clone(),
            token: self.github_token.clone(),
            timeout_secs: self.http_timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn github_config_requires_owner_and_repo() {
        let args = ServerArgs::parse_from(["server", "--github-owner", "band"]);
        assert!(args.github_config().is_err());

        let args = ServerArgs::parse_from([
            "server",
            "--github-owner",
            "band",
            "--github-repo",
            "setlist",
        ]);
        let config = args.github_config().unwrap();
        assert_eq!(config.owner, "band");
        assert_eq!(config.repo, "setlist");
        assert_eq!(config.branch, "main");
        assert_eq!(config.timeout_secs, 15);
    }

    #[test]
    fn memory_store_and_ttl_flags() {
        let args = ServerArgs::parse_from(["server", "--store", "memory", "--cache-ttl-secs", "5"]);
        assert_eq!(args.store, StoreKind::Memory);
        assert_eq!(args.cache_ttl(), Duration::from_secs(5));
    }
}
