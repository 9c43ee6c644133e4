//! Session management for MCP connections over HTTP.
//!
//! Each session owns a broadcast channel that fans server messages out to
//! its SSE subscribers. Stale sessions are dropped by a background task.
//! This is transport state only; it is unrelated to OAuth token storage.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{RwLock, broadcast};

/// Sessions idle longer than this are cleaned up.
const SESSION_TIMEOUT: Duration = Duration::from_secs(3600);

/// Cleanup interval for stale sessions.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Broadcast channel capacity per session.
const CHANNEL_CAPACITY: usize = 64;

/// A single MCP session.
pub struct Session {
    /// Unique session identifier.
    pub id: String,
    tx: broadcast::Sender<String>,
    last_active: RwLock<Instant>,
}

impl Session {
    fn new(id: String) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { id, tx, last_active: RwLock::new(Instant::now()) }
    }

    /// Broadcast a message to live subscribers. Dropped if nobody listens.
    pub async fn send(&self, message: String) {
        let _ = self.tx.send(message);
        self.touch().await;
    }

    /// Subscribe to live messages.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    /// Check if the session has been idle past the timeout.
    pub async fn is_stale(&self) -> bool {
        self.last_active.read().await.elapsed() > SESSION_TIMEOUT
    }

    /// Update the activity timestamp.
    pub async fn touch(&self) {
        *self.last_active.write().await = Instant::now();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("id", &self.id).finish()
    }
}

/// Global session manager.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, Arc<Session>>>>,
}

impl SessionManager {
    /// Create a new session manager.
    #[must_use]
    pub fn new() -> Self {
        Self { sessions: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Create a new session.
    pub async fn create_session(&self) -> Arc<Session> {
        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(Session::new(id.clone()));

        self.sessions.write().await.insert(id, Arc::clone(&session));

        tracing::info!(session_id = %session.id, "Created new session");
        session
    }

    /// Get an existing session by ID.
    pub async fn get_session(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Get a session by ID, falling back to a fresh one.
    pub async fn get_or_create_session(&self, id: Option<&str>) -> Arc<Session> {
        if let Some(id) = id {
            if let Some(session) = self.get_session(id).await {
                session.touch().await;
                return session;
            }
        }
        self.create_session().await
    }

    /// Clean up stale sessions, returning how many were removed.
    pub async fn cleanup_stale_sessions(&self) -> usize {
        let mut to_remove = Vec::new();

        {
            let sessions = self.sessions.read().await;
            for (id, session) in sessions.iter() {
                if session.is_stale().await {
                    to_remove.push(id.clone());
                }
            }
        }

        let count = to_remove.len();
        if count > 0 {
            let mut sessions = self.sessions.write().await;
            for id in to_remove {
                sessions.remove(&id);
                tracing::info!(session_id = %id, "Cleaned up stale session");
            }
        }

        count
    }

    /// Get session count (for health reporting).
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Start the background cleanup task.
    pub fn start_cleanup_task(&self) {
        let manager = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                let cleaned = manager.cleanup_stale_sessions().await;
                if cleaned > 0 {
                    tracing::debug!(count = cleaned, "Session cleanup completed");
                }
            }
        });
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_creation() {
        let manager = SessionManager::new();
        let session = manager.create_session().await;

        assert!(!session.id.is_empty());
        assert_eq!(manager.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_session_lookup() {
        let manager = SessionManager::new();
        let session = manager.create_session().await;
        let id = session.id.clone();

        assert!(manager.get_session(&id).await.is_some());
        assert!(manager.get_session("nonexistent").await.is_none());
    }

    #[tokio::test]
    async fn test_get_or_create_falls_back() {
        let manager = SessionManager::new();
        let session = manager.get_or_create_session(Some("unknown")).await;
        assert_ne!(session.id, "unknown");
        assert_eq!(manager.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_broadcast_to_subscriber() {
        let manager = SessionManager::new();
        let session = manager.create_session().await;

        let mut rx = session.subscribe();
        session.send(r#"{"jsonrpc":"2.0"}"#.to_string()).await;

        let received = rx.recv().await.unwrap();
        assert!(received.contains("jsonrpc"));
    }

    #[tokio::test]
    async fn test_fresh_sessions_survive_cleanup() {
        let manager = SessionManager::new();
        manager.create_session().await;
        assert_eq!(manager.cleanup_stale_sessions().await, 0);
        assert_eq!(manager.session_count().await, 1);
    }
}
