//! Live session registry
//!
//! Tracks which chat and call sockets are open, for `/health`, `/stats` and
//! the capacity limit. Conversation state lives with the socket task, not
//! here.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::ServerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// Browser chat socket
    Chat,
    /// Voice bridge socket from the media worker
    Call,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Chat => "chat",
            SessionKind::Call => "call",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub kind: SessionKind,
    pub started_at: DateTime<Utc>,
}

/// Registry of open sessions
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionInfo>>,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
        }
    }

    /// Register a new session. It is removed again when the guard drops.
    pub fn register(self: &Arc<Self>, kind: SessionKind) -> Result<SessionGuard, ServerError> {
        let mut sessions = self.sessions.write();

        if sessions.len() >= self.max_sessions {
            tracing::warn!(
                max_sessions = self.max_sessions,
                kind = kind.as_str(),
                "Rejecting session, registry full"
            );
            return Err(ServerError::Capacity(self.max_sessions));
        }

        let id = uuid::Uuid::new_v4().to_string();
        sessions.insert(
            id.clone(),
            SessionInfo {
                id: id.clone(),
                kind,
                started_at: Utc::now(),
            },
        );
        let active = sessions.len();
        drop(sessions);

        crate::metrics::record_session_opened(kind, active);
        tracing::info!(session_id = %id, kind = kind.as_str(), "Session opened");

        Ok(SessionGuard {
            registry: Arc::clone(self),
            id,
            kind,
        })
    }

    pub fn get(&self, id: &str) -> Option<SessionInfo> {
        self.sessions.read().get(id).cloned()
    }

    pub fn remove(&self, id: &str) -> Option<SessionInfo> {
        let mut sessions = self.sessions.write();
        let removed = sessions.remove(id);
        let active = sessions.len();
        drop(sessions);

        if let Some(info) = &removed {
            let duration = (Utc::now() - info.started_at).num_milliseconds() as f64 / 1000.0;
            crate::metrics::record_session_closed(info.kind, active, duration);
            tracing::info!(session_id = %id, kind = info.kind.as_str(), "Session closed");
        }
        removed
    }

    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn count_kind(&self, kind: SessionKind) -> usize {
        self.sessions
            .read()
            .values()
            .filter(|s| s.kind == kind)
            .count()
    }

    /// Session ids, oldest first
    pub fn list(&self) -> Vec<String> {
        let mut sessions: Vec<SessionInfo> = self.sessions.read().values().cloned().collect();
        sessions.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.id.cmp(&b.id)));
        sessions.into_iter().map(|s| s.id).collect()
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }
}

/// Keeps a session registered for as long as it lives
pub struct SessionGuard {
    registry: Arc<SessionRegistry>,
    id: String,
    kind: SessionKind,
}

impl SessionGuard {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry.remove(&self.id);
    }
}
