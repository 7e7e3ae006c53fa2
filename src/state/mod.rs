//! Session registry
//!
//! Sessions live in process memory only. Each one sits behind its own async
//! mutex so a session is only ever driven by one request at a time.

use crate::error::ChatError;
use crate::models::SessionConfig;
use crate::session::Session;
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

pub type SharedSession = Arc<Mutex<Session>>;

/// In-memory session registry
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, SharedSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Return the session for `id`, creating it with `config` if missing.
    /// The bool is true when a new session was created.
    pub async fn get_or_create(
        &self,
        id: Uuid,
        config: SessionConfig,
    ) -> Result<(SharedSession, bool)> {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(&id) {
                return Ok((session.clone(), false));
            }
        }

        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get(&id) {
            return Ok((session.clone(), false));
        }

        let session = Arc::new(Mutex::new(Session::with_id(id, config)?));
        sessions.insert(id, session.clone());
        info!(session_id = %id, "Session created");

        Ok((session, true))
    }

    pub async fn get(&self, id: Uuid) -> Result<SharedSession> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&id)
            .cloned()
            .ok_or(ChatError::SessionNotFound(id))
    }

    pub async fn remove(&self, id: Uuid) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions
            .remove(&id)
            .map(|_| info!(session_id = %id, "Session removed"))
            .ok_or(ChatError::SessionNotFound(id))
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
