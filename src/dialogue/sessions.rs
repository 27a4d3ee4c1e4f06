use super::state::SessionState;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const DEFAULT_SESSION: &str = "default";

/// Per-conversation state keyed by session id.
///
/// Holding a session's lock for the whole turn keeps its transitions
/// strictly sequential while other sessions proceed.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<Mutex<SessionState>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The session's state, created empty on first use.
    pub async fn get_or_create(&self, session_id: &str) -> Arc<Mutex<SessionState>> {
        let mut sessions = self.sessions.lock().await;
        Arc::clone(
            sessions
                .entry(session_id.to_string())
                .or_insert_with(|| {
                    tracing::debug!(session_id, "new dialogue session");
                    Arc::new(Mutex::new(SessionState::default()))
                }),
        )
    }

    pub async fn remove(&self, session_id: &str) -> bool {
        self.sessions.lock().await.remove(session_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
