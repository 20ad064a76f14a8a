//! Xtream Codes API Types
//!
//! Type definitions for the Xtream Codes Player API v2 responses this server
//! consumes. Providers are inconsistent about numbers vs strings, so most
//! fields are optional and lenient.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Provider account used to reach the Player API
#[derive(Debug, Clone)]
pub struct XtreamCredentials {
    /// Server base URL without trailing slash (e.g., "http://example.com:8080")
    pub server: String,
    pub username: String,
    pub password: String,
}

impl XtreamCredentials {
    pub fn new(server: &str, username: &str, password: &str) -> Self {
        Self {
            server: server.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Build the player_api.php base URL
    pub fn api_url(&self) -> String {
        format!(
            "{}/player_api.php?username={}&password={}",
            self.server,
            urlencoding::encode(&self.username),
            urlencoding::encode(&self.password)
        )
    }
}

// ============================================================================
// Authentication Response Types
// ============================================================================

/// Response from player_api.php with no action
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct XtreamAuthResponse {
    pub user_info: XtreamUserInfo,
}

/// User account information
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct XtreamUserInfo {
    /// 1 when the credentials were accepted; sent as number or string
    #[serde(default)]
    pub auth: Option<Value>,
}

impl XtreamUserInfo {
    pub fn is_authenticated(&self) -> bool {
        match &self.auth {
            Some(Value::Number(n)) => n.as_i64() == Some(1),
            Some(Value::String(s)) => s == "1",
            _ => false,
        }
    }
}

// ============================================================================
// Category Types
// ============================================================================

/// Live stream category
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct XtreamCategory {
    #[serde(deserialize_with = "string_or_number")]
    pub category_id: String,
    pub category_name: String,
}

// ============================================================================
// Live Stream Types
// ============================================================================

/// Live stream (channel) information
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct XtreamLiveStream {
    #[serde(default, deserialize_with = "string_or_empty")]
    pub name: String,
    #[serde(deserialize_with = "i64_or_string")]
    pub stream_id: i64,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub stream_icon: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub epg_channel_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub category_id: Option<String>,
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    value_to_string(Value::deserialize(deserializer)?)
        .ok_or_else(|| serde::de::Error::custom("expected string or number"))
}

fn string_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(value_to_string(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(value_to_string(Value::deserialize(deserializer)?))
}

fn i64_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| serde::de::Error::custom("stream_id out of range")),
        Value::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
        _ => Err(serde::de::Error::custom("expected integer stream_id")),
    }
}
