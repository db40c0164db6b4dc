//! `devtalk` — the DevTalk SNS server.
//!
//! # Quick start
//!
//! ```sh
//! # In-memory server on the default port (8001):
//! devtalk
//!
//! # Persistent SQLite database:
//! DEVTALK_DB=./devtalk.db devtalk
//!
//! # With Kakao login:
//! KAKAO_ID=... DEVTALK_PUBLIC_URL=https://devtalk.example.com devtalk
//! ```
//!
//! # Environment variables
//!
//! See [`devtalk_server::ServerConfig`] for the full list.

use std::sync::Arc;

use devtalk_server::{
    build_router, storage::sqlite::SqliteStorage, HttpOAuthClient, MemoryStorage, ServerConfig,
    Storage,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "devtalk_server=info,tower_http=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env();

    let storage: Arc<dyn Storage> = match &config.db_path {
        Some(path) => {
            tracing::info!("storage: SQLite at {path}");
            Arc::new(
                SqliteStorage::open(path)
                    .unwrap_or_else(|e| panic!("failed to open SQLite database at {path}: {e}")),
            )
        }
        None => {
            tracing::info!("storage: in-memory (data will not survive restart)");
            Arc::new(MemoryStorage::new())
        }
    };

    if let Err(e) = std::fs::create_dir_all(&config.upload_dir) {
        panic!(
            "failed to create upload directory {}: {e}",
            config.upload_dir.display()
        );
    }

    let providers: Vec<&str> = devtalk::Provider::OAUTH
        .into_iter()
        .filter(|p| config.credentials(*p).is_some())
        .map(|p| p.as_str())
        .collect();
    tracing::info!(?providers, "oauth providers configured");

    let oauth = HttpOAuthClient::new(config.clone()).expect("failed to build HTTP client for OAuth");
    let app = build_router(storage, config.clone(), Arc::new(oauth))
        .unwrap_or_else(|e| panic!("failed to compile templates: {e}"));

    tracing::info!("listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {e}", config.bind_addr));

    axum::serve(listener, app).await.expect("server error");
}
