use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::models::session::{SessionId, SessionRecord};

/// The authoritative set of active sessions.
///
/// Injected behind a trait so the in-memory map can be swapped for an
/// external cache without touching the gate or the handlers. The gate only
/// reads; creation happens at login, removal at logout or via the sweep.
pub trait SessionStore: Send + Sync {
    /// Creates a session for an authenticated user and returns its record.
    fn create(&self, user_id: i32, username: &str) -> SessionRecord;

    /// Looks up a session by id. Pure read, no side effect.
    fn get(&self, session_id: &SessionId) -> Option<SessionRecord>;

    /// Removes a session if present. Removing an absent id is a no-op.
    fn remove(&self, session_id: &SessionId);

    /// Removes every session older than `max_age`, returning how many.
    fn sweep_expired(&self, max_age: Duration) -> usize;
}

/// Process-local session store. All sessions are lost on restart, which
/// invalidates every outstanding token.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, SessionRecord>>,
}

impl MemorySessionStore {
    /// Creates a new, empty `MemorySessionStore`.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemorySessionStore {
    fn create(&self, user_id: i32, username: &str) -> SessionRecord {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        // Regenerate on collision; with 256-bit ids this effectively never loops.
        let session_id = loop {
            let candidate = SessionId::generate();
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        let record = SessionRecord {
            session_id: session_id.clone(),
            user_id,
            username: username.to_string(),
            created_at: Utc::now(),
        };

        sessions.insert(session_id, record.clone());
        record
    }

    fn get(&self, session_id: &SessionId) -> Option<SessionRecord> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
    }

    fn remove(&self, session_id: &SessionId) {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id);
    }

    fn sweep_expired(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let before = sessions.len();
        sessions.retain(|_, record| record.created_at > cutoff);
        before - sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn create_returns_distinct_unguessable_ids() {
        let store = MemorySessionStore::new();
        let mut seen = HashSet::new();

        for _ in 0..10_000 {
            let record = store.create(1, "A");
            assert!(seen.insert(record.session_id), "session id collision");
        }
    }

    #[test]
    fn get_resolves_only_known_sessions() {
        let store = MemorySessionStore::new();
        let record = store.create(7, "carol");

        let found = store.get(&record.session_id).expect("session should resolve");
        assert_eq!(found.user_id, 7);
        assert_eq!(found.username, "carol");

        assert!(store.get(&SessionId::generate()).is_none());
    }

    #[test]
    fn remove_is_idempotent() {
        let store = MemorySessionStore::new();
        let record = store.create(1, "A");

        store.remove(&record.session_id);
        assert!(store.get(&record.session_id).is_none());

        // Second removal of the same id is a no-op, not an error.
        store.remove(&record.session_id);
        assert!(store.get(&record.session_id).is_none());
    }

    #[test]
    fn sweep_removes_exactly_the_expired_sessions() {
        let store = MemorySessionStore::new();
        for i in 0..5 {
            store.create(i, "user");
        }

        assert_eq!(store.sweep_expired(Duration::hours(1)), 0);
        assert_eq!(store.sweep_expired(Duration::seconds(-1)), 5);
        assert_eq!(store.sweep_expired(Duration::seconds(-1)), 0);
    }
}
