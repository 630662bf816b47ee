use anyhow::{Context, Result};
use clap::Parser;
use songboard::api::{router, AppState};
use songboard::cache::SystemClock;
use songboard::config::{ServerArgs, StoreKind};
use songboard::remote::{FileStore, GitHubFileStore, MemoryFileStore};
use songboard::Repository;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "songboard=info,server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = ServerArgs::parse();

    let store: Arc<dyn FileStore> = match args.store {
        StoreKind::Github => {
            let config = args.github_config()?;
            info!(
                "Using GitHub repository {}/{} on branch {}",
                config.owner, config.repo, config.branch
            );
            Arc::new(GitHubFileStore::new(config).context("Failed to build GitHub client")?)
        }
        StoreKind::Memory => {
            warn!("Using in-memory store, data will be lost on exit");
            Arc::new(MemoryFileStore::new())
        }
    };

    let repo = Arc::new(Repository::new(store, args.cache_ttl(), Arc::new(SystemClock)));
    let app = router(Arc::new(AppState::new(repo)));

    let address = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {}", address))?;

    println!("🎵 Song suggestion board running on http://{}", address);
    println!("📋 Endpoints:");
    println!("   POST /login                          - Log in");
    println!("   GET  /songs                          - Browse suggestions");
    println!("   POST /songs                          - Suggest a song");
    println!("   POST /songs/:video_id/vote           - Like or unlike a song");
    println!("   GET  /stats                          - Statistics");
    println!("   GET  /admin/users                    - Manage accounts (admin)");

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
