//! Clients for the remote repository that holds the flat files.

use crate::config::GitHubConfig;
use crate::error::StoreError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use parking_lot::Mutex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// File content together with the token of the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub content: String,
    pub token: String,
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// `Ok(None)` when the file does not exist.
    async fn get(&self, path: &str) -> Result<Option<RemoteFile>, StoreError>;

    /// Writes `content` only if the stored version still matches `token`.
    /// A `None` token means the file is expected to be absent.
    /// Returns the token of the new version.
    async fn write(
        &self,
        path: &str,
        content: &str,
        token: Option<&str>,
        message: &str,
    ) -> Result<String, StoreError>;

    /// Like `write`, but without a token the current one is probed first
    /// so an existing file is not blindly overwritten.
    async fn put(
        &self,
        path: &str,
        content: &str,
        token: Option<&str>,
        message: &str,
    ) -> Result<String, StoreError> {
        match token {
            Some(token) => self.write(path, content, Some(token), message).await,
            None => {
                let probed = self.get(path).await?.map(|file| file.token);
                self.write(path, content, probed.as_deref(), message).await
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    content: String,
    sha: String,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct UpdateResponse {
    content: UpdatedContent,
}

#[derive(Debug, Deserialize)]
struct UpdatedContent {
    sha: String,
}

/// GitHub contents API. The blob sha is the concurrency token.
pub struct GitHubFileStore {
    client: Client,
    config: GitHubConfig,
}

impl GitHubFileStore {
    pub fn new(config: GitHubConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("songboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.owner,
            self.config.repo,
            path
        )
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.header("Accept", "application/vnd.github+json");
        match &self.config.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl FileStore for GitHubFileStore {
    async fn get(&self, path: &str) -> Result<Option<RemoteFile>, StoreError> {
        let response = self
            .request(self.client.get(self.url(path)))
            .query(&[("ref", self.config.branch.as_str())])
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(path, "File not found in repository");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(api_error(status, response).await);
        }

        let body: ContentResponse = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        // GitHub wraps the base64 payload at 60 columns.
        let packed: String = body.content.split_whitespace().collect();
        let bytes = STANDARD
            .decode(packed)
            .map_err(|e| StoreError::InvalidResponse(format!("base64: {}", e)))?;
        let content = String::from_utf8(bytes)
            .map_err(|_| StoreError::InvalidResponse(format!("{} is not UTF-8", path)))?;

        Ok(Some(RemoteFile {
            content,
            token: body.sha,
        }))
    }

    async fn write(
        &self,
        path: &str,
        content: &str,
        token: Option<&str>,
        message: &str,
    ) -> Result<String, StoreError> {
        let request = UpdateRequest {
            message,
            content: STANDARD.encode(content.as_bytes()),
            branch: &self.config.branch,
            sha: token,
        };

        let response = self
            .request(self.client.put(self.url(path)))
            .json(&request)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if status == StatusCode::CONFLICT || status == StatusCode::UNPROCESSABLE_ENTITY {
            warn!(path, %status, "Write rejected, stored version changed");
            return Err(StoreError::Conflict {
                path: path.to_string(),
            });
        }
        if !status.is_success() {
            return Err(api_error(status, response).await);
        }

        let body: UpdateResponse = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        info!(path, message, "Committed file");
        Ok(body.content.sha)
    }
}

fn network_error(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Network(format!("request timed out: {}", e))
    } else {
        StoreError::Network(e.to_string())
    }
}

async fn api_error(status: StatusCode, response: reqwest::Response) -> StoreError {
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    StoreError::Api {
        status: status.as_u16(),
        message,
    }
}

#[derive(Debug, Clone)]
struct StoredFile {
    content: String,
    token: String,
}

/// Process-local store with the same token rules as the GitHub one.
#[derive(Default)]
pub struct MemoryFileStore {
    files: Mutex<HashMap<String, StoredFile>>,
    commits: Mutex<Vec<String>>,
    revision: Mutex<u64>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit messages of every accepted write, oldest first.
    pub fn commits(&self) -> Vec<String> {
        self.commits.lock().clone()
    }

    fn next_token(&self, content: &str) -> String {
        let mut revision = self.revision.lock();
        *revision += 1;

        let mut hasher = Sha256::new();
        hasher.update(revision.to_le_bytes());
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn get(&self, path: &str) -> Result<Option<RemoteFile>, StoreError> {
        Ok(self.files.lock().get(path).map(|file| RemoteFile {
            content: file.content.clone(),
            token: file.token.clone(),
        }))
    }

    async fn write(
        &self,
        path: &str,
        content: &str,
        token: Option<&str>,
        message: &str,
    ) -> Result<String, StoreError> {
        let new_token = self.next_token(content);
        let mut files = self.files.lock();

        let current = files.get(path).map(|file| file.token.as_str());
        if current != token {
            return Err(StoreError::Conflict {
                path: path.to_string(),
            });
        }

        files.insert(
            path.to_string(),
            StoredFile {
                content: content.to_string(),
                token: new_token.clone(),
            },
        );
        self.commits.lock().push(message.to_string());

        Ok(new_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_reads_as_none() {
        let store = MemoryFileStore::new();
        assert!(store.get("votos.json").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_without_token_probes_existing_version() {
        let store = MemoryFileStore::new();
        store.put("votos.json", "{}", None, "create").await.unwrap();
        store
            .put("votos.json", r#"{"a": {}}"#, None, "update")
            .await
            .unwrap();

        let file = store.get("votos.json").await.unwrap().unwrap();
        assert_eq!(file.content, r#"{"a": {}}"#);
        assert_eq!(store.commits(), vec!["create", "update"]);
    }

    #[tokio::test]
    async fn stale_token_is_a_conflict() {
        let store = MemoryFileStore::new();
        let first = store.put("votos.json", "{}", None, "create").await.unwrap();
        store
            .put("votos.json", "{\"x\": {}}", Some(&first), "other writer")
            .await
            .unwrap();

        let err = store
            .put("votos.json", "{\"y\": {}}", Some(&first), "stale")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(store.commits().len(), 2);
    }

    #[tokio::test]
    async fn rewriting_same_content_changes_token() {
        let store = MemoryFileStore::new();
        let first = store.put("f", "same", None, "one").await.unwrap();
        let second = store.put("f", "same", Some(&first), "two").await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn blind_write_over_existing_file_conflicts() {
        let store = MemoryFileStore::new();
        store.put("f", "one", None, "one").await.unwrap();
        let err = store.write("f", "two", None, "blind").await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }
}
