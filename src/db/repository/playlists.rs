//! Playlist repository backed by an in-memory list

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PlaylistRepository, RepositoryError};
use crate::models::{Playlist, PlaylistSummary};

/// Playlists in insertion order
#[derive(Default)]
pub struct InMemoryPlaylistRepository {
    playlists: RwLock<Vec<Arc<Playlist>>>,
}

impl InMemoryPlaylistRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlaylistRepository for InMemoryPlaylistRepository {
    async fn create(&self, playlist: Playlist) -> Result<Arc<Playlist>, RepositoryError> {
        let playlist = Arc::new(playlist);
        self.playlists.write().await.push(playlist.clone());
        Ok(playlist)
    }

    async fn find_for_user(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Arc<Playlist>>, RepositoryError> {
        Ok(self
            .playlists
            .read()
            .await
            .iter()
            .find(|p| p.id == id && p.user_id == user_id)
            .cloned())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<PlaylistSummary>, RepositoryError> {
        Ok(self
            .playlists
            .read()
            .await
            .iter()
            .filter(|p| p.user_id == user_id)
            .map(|p| p.summary())
            .collect())
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.playlists.read().await.len())
    }
}
