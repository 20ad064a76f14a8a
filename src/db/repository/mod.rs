//! Repositories
//!
//! Storage traits injected into request handlers, separating data access
//! from the HTTP layer. The in-memory implementations can be swapped for a
//! persistent store without touching handlers.

pub mod playlists;
pub mod sessions;
pub mod users;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Playlist, PlaylistSummary, Session, User};

pub use playlists::InMemoryPlaylistRepository;
pub use sessions::InMemorySessionRepository;
pub use users::InMemoryUserRepository;

/// Repository layer errors
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Unique username constraint
    #[error("Username already exists: {0}")]
    UsernameTaken(String),
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Store a new user; usernames are unique
    async fn create(&self, user: User) -> Result<User, RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;
    async fn count(&self) -> Result<usize, RepositoryError>;
}

#[async_trait]
pub trait PlaylistRepository: Send + Sync {
    async fn create(&self, playlist: Playlist) -> Result<Arc<Playlist>, RepositoryError>;
    /// Find a playlist only if `user_id` owns it
    async fn find_for_user(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Arc<Playlist>>, RepositoryError>;
    /// Summaries of a user's playlists, oldest first
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<PlaylistSummary>, RepositoryError>;
    async fn count(&self) -> Result<usize, RepositoryError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, user_id: Uuid) -> Result<Session, RepositoryError>;
    /// Resolve a live session token to its user; expired sessions are purged
    async fn find_user(&self, token: Uuid) -> Result<Option<Uuid>, RepositoryError>;
    /// Returns whether a session was removed
    async fn delete(&self, token: Uuid) -> Result<bool, RepositoryError>;
}
