use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::engine::Engine;
use crate::models::game_session::GameSession;

pub type SharedSession = Arc<Mutex<GameSession>>;
pub type SharedEngine = Arc<Mutex<Box<dyn Engine>>>;

/// Application state shared between connections
///
/// Each connection owns one session under its own lock. The engine process is
/// shared by every session and serialized by its lock; always take a session
/// lock before the engine lock.
pub struct AppState {
    pub sessions: Mutex<HashMap<String, SharedSession>>,
    pub engine: SharedEngine,
}

impl AppState {
    pub fn new(engine: Box<dyn Engine>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            engine: Arc::new(Mutex::new(engine)),
        }
    }

    pub fn register(&self, connection_id: &str, session: SharedSession) -> usize {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.insert(connection_id.to_string(), session);
        sessions.len()
    }

    pub fn unregister(&self, connection_id: &str) -> usize {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.remove(connection_id);
        sessions.len()
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
