use anyhow::Context;
use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    Channel, Playlist, PlaylistCreatedResponse, PlaylistSource, PlaylistSummary,
    XtreamPlaylistRequest,
};
use crate::routes::error::ApiError;
use crate::routes::session::AuthUser;
use crate::services::m3u_generator::{generate_m3u, StreamDescriptor};
use crate::services::m3u_parser::parse_m3u;
use crate::services::metrics;
use crate::services::xtream::{XtreamClient, XtreamCredentials};
use crate::AppState;

/// Multipart field holding the playlist file
const FILE_FIELD: &str = "m3uFile";

/// Password placed in the generated Xtream API URL of uploads
const UPLOAD_API_PASSWORD: &str = "defaultPass";

/// Write playlist text under the upload directory, returning its path
async fn save_playlist_file(dir: &FsPath, prefix: &str, content: &[u8]) -> anyhow::Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create upload dir {}", dir.display()))?;

    let path = dir.join(format!("{}-{}.m3u", prefix, Uuid::new_v4()));
    tokio::fs::write(&path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}

fn has_m3u_extension(file_name: &str) -> bool {
    FsPath::new(file_name)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("m3u"))
        .unwrap_or(false)
}

/// `<base>/api/xtream?username=..&password=..&channels=<json>` for an upload
fn upload_api_url(base: &str, username: &str, channels: &[Channel]) -> anyhow::Result<String> {
    let channels_json = serde_json::to_string(channels).context("Failed to encode channels")?;
    Ok(format!(
        "{}/api/xtream?username={}&password={}&channels={}",
        base,
        urlencoding::encode(username),
        UPLOAD_API_PASSWORD,
        urlencoding::encode(&channels_json)
    ))
}

fn download_url(state: &AppState, playlist_id: Uuid) -> String {
    format!("{}/api/download/{}", state.config.base_url, playlist_id)
}

/// POST /api/upload-m3u - Store and parse an uploaded .m3u file
pub async fn upload_m3u(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        match field.name() {
            Some(FILE_FIELD) => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                if !has_m3u_extension(&file_name) {
                    return Err(ApiError::BadRequest(
                        "Only .m3u files are allowed".to_string(),
                    ));
                }

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                file = Some((file_name, data.to_vec()));
            }
            Some("name") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                name = Some(text.trim().to_string()).filter(|n| !n.is_empty());
            }
            _ => {}
        }
    }

    let (file_name, data) =
        file.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;

    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    let file_path = save_playlist_file(&state.config.upload_dir, "playlist", &data).await?;
    let channels = parse_m3u(&String::from_utf8_lossy(&data));

    let name = name.unwrap_or_else(|| {
        FsPath::new(&file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Playlist".to_string())
    });
    let xtream_api_url = upload_api_url(&state.config.xtream_api_base, &user.username, &channels)?;

    let playlist = state
        .playlists
        .create(Playlist::new(
            name,
            user_id,
            file_path,
            channels,
            PlaylistSource::Upload {
                xtream_api_url: xtream_api_url.clone(),
            },
        ))
        .await?;

    metrics::record_playlist(playlist.source.kind(), playlist.channels.len());
    tracing::info!(
        "Playlist uploaded: {} ({} channels) by {}",
        playlist.id,
        playlist.channels.len(),
        user.username
    );

    Ok(Json(PlaylistCreatedResponse {
        message: "File uploaded".to_string(),
        playlist_id: playlist.id,
        channel_count: playlist.channels.len(),
        playlist_url: download_url(&state, playlist.id),
        xtream_api_url: Some(xtream_api_url),
    }))
}

/// POST /api/xtream-playlist - Build a playlist from an Xtream provider's live streams
pub async fn create_xtream_playlist(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<XtreamPlaylistRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.api_url.is_empty() || payload.username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "apiUrl, username and password are required".to_string(),
        ));
    }

    let creds = XtreamCredentials::new(&payload.api_url, &payload.username, &payload.password);
    let client = XtreamClient::new(state.http.clone(), &creds);

    let auth = client.get_auth().await?;
    if !auth.user_info.is_authenticated() {
        tracing::warn!("Xtream auth rejected for {} at {}", creds.username, creds.server);
        return Err(ApiError::XtreamAuth);
    }

    let streams = client.get_live_streams().await?;
    let categories = client.get_live_categories().await.unwrap_or_else(|e| {
        tracing::warn!("Live categories unavailable, group titles left empty: {}", e);
        Vec::new()
    });

    let descriptors = StreamDescriptor::from_live_streams(streams, &categories);
    let m3u = generate_m3u(&descriptors, &creds.server, &creds.username, &creds.password);

    let file_path = save_playlist_file(&state.config.upload_dir, "xtream", m3u.as_bytes()).await?;

    // Re-parse so both sources yield channels the same way
    let channels = parse_m3u(&m3u);

    let playlist = state
        .playlists
        .create(Playlist::new(
            format!("Xtream Playlist ({})", Utc::now().format("%Y-%m-%d")),
            user_id,
            file_path,
            channels,
            PlaylistSource::Xtream {
                api_url: creds.server.clone(),
                username: creds.username.clone(),
            },
        ))
        .await?;

    metrics::record_playlist(playlist.source.kind(), playlist.channels.len());
    tracing::info!(
        "Xtream playlist created: {} ({} of {} streams)",
        playlist.id,
        playlist.channels.len(),
        descriptors.len()
    );

    Ok(Json(PlaylistCreatedResponse {
        message: "Xtream playlist generated".to_string(),
        playlist_id: playlist.id,
        channel_count: playlist.channels.len(),
        playlist_url: download_url(&state, playlist.id),
        xtream_api_url: None,
    }))
}

/// GET /api/playlists - Summaries of the caller's playlists
pub async fn list_playlists(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<PlaylistSummary>>, ApiError> {
    Ok(Json(state.playlists.list_for_user(user_id).await?))
}

async fn find_owned(
    state: &AppState,
    id: Uuid,
    user_id: Uuid,
) -> Result<Arc<Playlist>, ApiError> {
    state
        .playlists
        .find_for_user(id, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Playlist not found".to_string()))
}

fn parse_playlist_id(id: &str) -> Result<Uuid, ApiError> {
    // Unknown ids and malformed ids look the same to the caller
    Uuid::parse_str(id).map_err(|_| ApiError::NotFound("Playlist not found".to_string()))
}

/// GET /api/playlist/:id - Full playlist with channels
pub async fn get_playlist(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Arc<Playlist>>, ApiError> {
    let id = parse_playlist_id(&id)?;
    Ok(Json(find_owned(&state, id, user_id).await?))
}

/// Content-Disposition for `<name>.m3u`, with an ASCII fallback name
fn attachment_disposition(name: &str) -> String {
    let file_name = format!("{}.m3u", name);
    let ascii: String = file_name
        .chars()
        .map(|c| if c.is_ascii() && c != '"' && c != '\\' && !c.is_ascii_control() { c } else { '_' })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(&file_name)
    )
}

/// GET /api/download/:id - Stored playlist file as an attachment
pub async fn download_playlist(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_playlist_id(&id)?;
    let playlist = find_owned(&state, id, user_id).await?;

    let body = tokio::fs::read(&playlist.file_path)
        .await
        .with_context(|| format!("Failed to read {}", playlist.file_path.display()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "audio/x-mpegurl".to_string()),
            (
                header::CONTENT_DISPOSITION,
                attachment_disposition(&playlist.name),
            ),
        ],
        body,
    ))
}
