//! Status channel session registry.
//!
//! # Responsibilities
//! - Assign monotonically increasing connection IDs (from 1, never reused)
//! - Track currently-open sessions
//! - Deregister each session exactly once, however it ends

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::observability::metrics;

/// Unique identifier for a status channel session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Tracks open status channel sessions.
///
/// Owned by the HTTP layer and shared via `Arc`; entries are only added and
/// removed through [`ConnectionRegistry::register`] and the returned guard.
#[derive(Debug)]
pub struct ConnectionRegistry {
    next_id: AtomicU64,
    sessions: DashMap<ConnectionId, Instant>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            sessions: DashMap::new(),
        }
    }

    /// Register a new session. It stays registered until the guard is dropped.
    pub fn register(self: &Arc<Self>) -> ConnectionGuard {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.sessions.insert(id, Instant::now());
        let active = self.sessions.len();
        metrics::set_active_sessions(active);

        tracing::info!(connection_id = %id, active_connections = active, "New connection");

        ConnectionGuard {
            registry: Arc::clone(self),
            id,
        }
    }

    /// Number of currently-open sessions.
    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.sessions.contains_key(&id)
    }

    fn deregister(&self, id: ConnectionId) -> Option<Duration> {
        let removed = self.sessions.remove(&id).map(|(_, opened)| opened.elapsed());
        metrics::set_active_sessions(self.sessions.len());
        removed
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that tracks a session's lifetime.
/// Removes the session from the registry when dropped.
#[derive(Debug)]
pub struct ConnectionGuard {
    registry: Arc<ConnectionRegistry>,
    id: ConnectionId,
}

impl ConnectionGuard {
    /// Get this session's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let duration = self.registry.deregister(self.id);
        tracing::info!(
            connection_id = %self.id,
            duration = ?duration.unwrap_or_default(),
            active_connections = self.registry.active_count(),
            "Connection closed"
        );
    }
}
