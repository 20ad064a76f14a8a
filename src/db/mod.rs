//! Storage module
//!
//! Repository traits plus their in-memory backends:
//! - Users with unique usernames
//! - Playlists scoped to their owner
//! - Login sessions with a TTL

pub mod repository;

// Re-export commonly used items
pub use repository::{
    InMemoryPlaylistRepository, InMemorySessionRepository, InMemoryUserRepository,
    PlaylistRepository, RepositoryError, SessionRepository, UserRepository,
};
