use std::env;
use std::path::PathBuf;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,
    pub node_env: String,
    pub base_url: String,
    pub static_dir: PathBuf,

    // Playlists
    pub upload_dir: PathBuf,
    pub max_upload_mb: usize,
    pub xtream_api_base: String,

    // Session
    pub session_ttl_seconds: u64,

    // Provider fetch
    pub fetch_timeout_ms: u64,
    pub user_agent: String,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let base_url = env::var("BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            // Server
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            node_env: env::var("NODE_ENV").unwrap_or_else(|_| "development".to_string()),
            static_dir: env::var("STATIC_DIR")
                .unwrap_or_else(|_| "public".to_string())
                .into(),

            // Playlists
            upload_dir: env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "uploads".to_string())
                .into(),
            max_upload_mb: env::var("MAX_UPLOAD_MB")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .unwrap_or(50),
            xtream_api_base: env::var("XTREAM_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| base_url.clone()),

            // Session
            session_ttl_seconds: env::var("SESSION_TTL_SECONDS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .unwrap_or(86_400), // 24 hours

            // Provider fetch
            fetch_timeout_ms: env::var("FETCH_TIMEOUT_MS")
                .unwrap_or_else(|_| "30000".to_string())
                .parse()
                .unwrap_or(30_000),

            // Use VLC user agent to avoid IPTV server blocks
            user_agent: env::var("USER_AGENT")
                .unwrap_or_else(|_| "VLC/3.0.20 LibVLC/3.0.20".to_string()),

            base_url,
        }
    }

    /// Session cookies are marked Secure in production
    pub fn secure_cookies(&self) -> bool {
        self.node_env == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
