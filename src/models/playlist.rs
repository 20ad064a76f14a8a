use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Duration used when an EXTINF line carries none (live stream)
pub const UNKNOWN_DURATION: &str = "-1";

/// One parsed playlist entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub duration: String,
    pub tvg_id: String,
    pub tvg_name: String,
    pub tvg_logo: String,
    pub group_title: String,
    pub title: String,
    pub url: String,
}

/// Where a stored playlist came from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PlaylistSource {
    /// Uploaded .m3u file
    #[serde(rename_all = "camelCase")]
    Upload { xtream_api_url: String },
    /// Generated from an Xtream Codes provider
    #[serde(rename_all = "camelCase")]
    Xtream { api_url: String, username: String },
}

impl PlaylistSource {
    /// Label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            PlaylistSource::Upload { .. } => "upload",
            PlaylistSource::Xtream { .. } => "xtream",
        }
    }
}

/// A stored playlist owned by one user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: Uuid,
    pub name: String,
    pub user_id: Uuid,
    #[serde(skip_serializing)]
    pub file_path: PathBuf,
    pub channels: Vec<Channel>,
    pub source: PlaylistSource,
    pub created_at: DateTime<Utc>,
}

impl Playlist {
    pub fn new(
        name: impl Into<String>,
        user_id: Uuid,
        file_path: PathBuf,
        channels: Vec<Channel>,
        source: PlaylistSource,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            user_id,
            file_path,
            channels,
            source,
            created_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> PlaylistSummary {
        PlaylistSummary {
            id: self.id,
            name: self.name.clone(),
            channel_count: self.channels.len(),
        }
    }
}

/// Entry of GET /api/playlists
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    pub id: Uuid,
    pub name: String,
    pub channel_count: usize,
}

/// Request body for POST /api/xtream-playlist
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XtreamPlaylistRequest {
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Response for upload and Xtream playlist creation
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistCreatedResponse {
    pub message: String,
    pub playlist_id: Uuid,
    pub channel_count: usize,
    pub playlist_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xtream_api_url: Option<String>,
}
