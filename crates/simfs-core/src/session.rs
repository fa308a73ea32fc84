//! Session registry: independent simulation instances keyed by a
//! caller-chosen session id.
//!
//! Each session owns its own [`FileSystem`] behind an `Arc<Mutex<_>>`,
//! so callers serving multiple clients hold one registry and lock per
//! session, never globally.

use crate::FileSystem;
use parking_lot::Mutex;
use simfs_error::Result;
use simfs_types::DEFAULT_CAPACITY;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub struct SessionRegistry {
    capacity: u64,
    sessions: Mutex<HashMap<String, Arc<Mutex<FileSystem>>>>,
}

impl SessionRegistry {
    /// Registry whose sessions get the default 100 MB capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Registry whose sessions get `capacity` bytes each.
    #[must_use]
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            capacity,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch the session's instance, bootstrapping a fresh one on
    /// first use.
    pub fn session(&self, id: &str) -> Result<Arc<Mutex<FileSystem>>> {
        let mut sessions = self.sessions.lock();
        if let Some(existing) = sessions.get(id) {
            return Ok(Arc::clone(existing));
        }
        let fresh = Arc::new(Mutex::new(FileSystem::with_capacity(self.capacity)?));
        sessions.insert(id.to_owned(), Arc::clone(&fresh));
        debug!(session = id, capacity = self.capacity, "session created");
        Ok(fresh)
    }

    /// Replace the session's instance with a freshly bootstrapped one.
    pub fn reset(&self, id: &str) -> Result<String> {
        let fresh = Arc::new(Mutex::new(FileSystem::with_capacity(self.capacity)?));
        self.sessions.lock().insert(id.to_owned(), fresh);
        debug!(session = id, "session reset");
        Ok("File system reset to initial state".to_owned())
    }

    /// Drop a session entirely. Returns whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        self.sessions.lock().remove(id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
