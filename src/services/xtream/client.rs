//! Xtream Codes API Client
//!
//! HTTP client for the Player API v2 endpoints needed to build a live playlist.

use super::types::*;
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error};

/// Xtream API Client
pub struct XtreamClient {
    http: Client,
    base_url: String,
}

impl XtreamClient {
    /// Create a client sharing an existing HTTP connection pool
    pub fn new(http: Client, creds: &XtreamCredentials) -> Self {
        Self {
            http,
            base_url: creds.api_url(),
        }
    }

    /// Make a GET request with optional action parameter
    async fn get<T: DeserializeOwned>(&self, action: &str) -> Result<T, XtreamError> {
        let url = if action.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}&action={}", self.base_url, action)
        };

        debug!("Xtream API request: {}", if action.is_empty() { "auth" } else { action });

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| XtreamError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(XtreamError::Http(status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| XtreamError::Network(e.to_string()))?;

        if text.trim().is_empty() || text == "null" {
            return Err(XtreamError::EmptyResponse);
        }

        serde_json::from_str(&text).map_err(|e| {
            error!(
                "Failed to parse Xtream response for action '{}': {}",
                action, e
            );
            debug!("Response text: {}", text.chars().take(500).collect::<String>());
            XtreamError::Parse(e.to_string())
        })
    }

    /// Get authentication info (user_info + server_info)
    pub async fn get_auth(&self) -> Result<XtreamAuthResponse, XtreamError> {
        self.get("").await
    }

    /// Get live stream categories
    pub async fn get_live_categories(&self) -> Result<Vec<XtreamCategory>, XtreamError> {
        self.get("get_live_categories").await
    }

    /// Get all live streams
    pub async fn get_live_streams(&self) -> Result<Vec<XtreamLiveStream>, XtreamError> {
        self.get("get_live_streams").await
    }
}

/// Xtream API Error types
#[derive(Debug, Error)]
pub enum XtreamError {
    /// Network/connection error
    #[error("Network error: {0}")]
    Network(String),
    /// HTTP error (non-2xx status)
    #[error("HTTP error: {0}")]
    Http(u16),
    /// JSON parsing error
    #[error("Parse error: {0}")]
    Parse(String),
    /// Empty response from server
    #[error("Empty response")]
    EmptyResponse,
}
