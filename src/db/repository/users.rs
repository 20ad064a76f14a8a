//! User repository backed by an in-memory map

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RepositoryError, UserRepository};
use crate::models::User;

#[derive(Default)]
struct UserTable {
    by_id: HashMap<Uuid, User>,
    by_username: HashMap<String, Uuid>,
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    table: RwLock<UserTable>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let mut table = self.table.write().await;

        if table.by_username.contains_key(&user.username) {
            return Err(RepositoryError::UsernameTaken(user.username));
        }

        table.by_username.insert(user.username.clone(), user.id);
        table.by_id.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self.table.read().await.by_id.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table
            .by_username
            .get(username)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.table.read().await.by_id.len())
    }
}
