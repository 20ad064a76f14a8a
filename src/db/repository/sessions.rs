//! Session repository backed by an in-memory map with TTL

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RepositoryError, SessionRepository};
use crate::models::Session;

pub struct InMemorySessionRepository {
    ttl_seconds: u64,
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl InMemorySessionRepository {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            ttl_seconds,
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, user_id: Uuid) -> Result<Session, RepositoryError> {
        let session = Session::new(user_id);
        let now = Utc::now();

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| !s.is_expired(self.ttl_seconds, now));
        sessions.insert(session.token, session.clone());
        Ok(session)
    }

    async fn find_user(&self, token: Uuid) -> Result<Option<Uuid>, RepositoryError> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(&token) {
                None => return Ok(None),
                Some(s) if !s.is_expired(self.ttl_seconds, now) => return Ok(Some(s.user_id)),
                Some(_) => {}
            }
        }

        tracing::debug!("Session {} expired", token);
        self.sessions.write().await.remove(&token);
        Ok(None)
    }

    async fn delete(&self, token: Uuid) -> Result<bool, RepositoryError> {
        Ok(self.sessions.write().await.remove(&token).is_some())
    }
}
