//! The session log: every completed session, newest first, stored as one JSON
//! array under a single key.

use crate::error::StoreError;
use crate::kv::KeyValueStore;
use crate::session::Session;
use serde::Deserialize;
use std::sync::Mutex;

/// Default key holding the session log
pub const SESSIONS_KEY: &str = "sessions";

/// Record as found on disk. Older or hand-edited logs may carry a
/// non-positive `minutes`, which is clamped on the way in.
#[derive(Deserialize)]
struct StoredSession {
    id: String,
    date: String,
    minutes: i64,
    kicks: u32,
}

impl From<StoredSession> for Session {
    fn from(raw: StoredSession) -> Self {
        if raw.minutes < 1 {
            tracing::warn!(id = %raw.id, minutes = raw.minutes, "clamping session minutes to 1");
        }
        Session {
            id: raw.id,
            date: raw.date,
            minutes: raw.minutes.max(1) as u64,
            kicks: raw.kicks,
        }
    }
}

pub struct SessionStore<K: KeyValueStore> {
    kv: K,
    key: String,
    // Serializes the read-modify-write in `append`
    write_lock: Mutex<()>,
}

impl<K: KeyValueStore> SessionStore<K> {
    pub fn new(kv: K, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &K {
        &self.kv
    }

    /// Read the whole log. A store that was never written yields an empty log.
    pub fn load_all(&self) -> Result<Vec<Session>, StoreError> {
        let raw = self
            .kv
            .get(&self.key)
            .map_err(|e| StoreError::read(&self.key, e))?;

        match raw {
            None => Ok(Vec::new()),
            Some(content) => self.decode(&content),
        }
    }

    /// Read the log for display, degrading to an empty list on failure.
    /// Failures are logged, and a corrupt log is reported separately from an
    /// unreadable one.
    pub fn load_or_empty(&self) -> (Vec<Session>, Option<StoreError>) {
        match self.load_all() {
            Ok(sessions) => (sessions, None),
            Err(e) => {
                if e.is_corrupt() {
                    tracing::error!(key = %self.key, error = %e, "session log is corrupt, showing empty list");
                } else {
                    tracing::warn!(key = %self.key, error = %e, "session log unavailable");
                }
                (Vec::new(), Some(e))
            }
        }
    }

    /// Insert `session` at the head of the log and write the log back.
    pub fn append(&self, session: Session) -> Result<Session, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut sessions = self.load_all()?;
        let session = dedupe_id(session, &sessions);
        sessions.insert(0, session.clone());

        let encoded = serde_json::to_string(&sessions).map_err(|e| StoreError::Encode {
            key: self.key.clone(),
            source: e,
        })?;
        self.kv
            .set(&self.key, &encoded)
            .map_err(|e| StoreError::write(&self.key, e))?;

        tracing::info!(id = %session.id, minutes = session.minutes, total = sessions.len(), "session saved");
        Ok(session)
    }

    fn decode(&self, content: &str) -> Result<Vec<Session>, StoreError> {
        if content.trim().is_empty() {
            return Err(StoreError::corrupt(&self.key, "empty value"));
        }
        let stored: Vec<StoredSession> = serde_json::from_str(content)
            .map_err(|e| StoreError::corrupt(&self.key, e.to_string()))?;
        Ok(stored.into_iter().map(Session::from).collect())
    }
}

/// Timestamp ids collide when two saves land in the same millisecond; the
/// later one gets a random suffix.
fn dedupe_id(mut session: Session, existing: &[Session]) -> Session {
    if existing.iter().any(|s| s.id == session.id) {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        tracing::debug!(id = %session.id, "session id already taken, adding suffix");
        session.id = format!("{}-{}", session.id, &suffix[..8]);
    }
    session
}
