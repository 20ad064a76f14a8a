mod config;
mod db;
mod models;
mod routes;
mod services;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::{
    InMemoryPlaylistRepository, InMemorySessionRepository, InMemoryUserRepository,
    PlaylistRepository, SessionRepository, UserRepository,
};

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub http: reqwest::Client,
    pub users: Arc<dyn UserRepository>,
    pub playlists: Arc<dyn PlaylistRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub start_time: Instant,
}

impl AppState {
    /// State backed by the in-memory repositories
    pub fn in_memory(config: Config, http: reqwest::Client) -> Self {
        let sessions = InMemorySessionRepository::new(config.session_ttl_seconds);
        Self {
            config,
            http,
            users: Arc::new(InMemoryUserRepository::new()),
            playlists: Arc::new(InMemoryPlaylistRepository::new()),
            sessions: Arc::new(sessions),
            start_time: Instant::now(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "xstream_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Load configuration
    let config = Config::from_env();
    let port = config.port;

    tracing::info!("Starting Xstream Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.node_env);

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    tracing::info!("Upload directory: {}", config.upload_dir.display());

    // Shared HTTP client for Xtream providers
    let http = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_millis(config.fetch_timeout_ms))
        .gzip(true)
        .build()?;

    let state = Arc::new(AppState::in_memory(config, http));
    let app = routes::router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
