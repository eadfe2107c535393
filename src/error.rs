//! Error types for the session store.

use thiserror::Error;

/// Failures at the persistence boundary.
///
/// Callers tell "storage broken" apart from "data unreadable": a corrupt log
/// is still a log the user cares about, so it is never reported as empty.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend could not be read
    #[error("failed to read '{key}': {source}")]
    Read {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The stored value is not a session log
    #[error("stored data under '{key}' is corrupt: {message}")]
    Corrupt { key: String, message: String },

    /// The backend rejected the write
    #[error("failed to write '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The log could not be encoded
    #[error("failed to encode '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub fn read(key: &str, source: std::io::Error) -> Self {
        Self::Read {
            key: key.to_string(),
            source,
        }
    }

    pub fn corrupt(key: &str, message: impl Into<String>) -> Self {
        Self::Corrupt {
            key: key.to_string(),
            message: message.into(),
        }
    }

    pub fn write(key: &str, source: std::io::Error) -> Self {
        Self::Write {
            key: key.to_string(),
            source,
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}
