//! Local key-value storage.
//!
//! Values are opaque strings addressed by key. The file backend keeps one
//! `<key>.json` file per key under a data directory and replaces it with a
//! rename so a crash mid-write leaves the previous value intact.

use std::io;
use std::path::{Path, PathBuf};

pub trait KeyValueStore: Send + Sync {
    /// `Ok(None)` when the key has never been written
    fn get(&self, key: &str) -> io::Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> io::Result<()>;
}

/// File-per-key storage under a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Staging file renamed over `path_for(key)` on write
    pub fn tmp_path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!(".{}.json.tmp", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = self.tmp_path_for(key);
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)
    }
}

#[cfg(test)]
pub use memory::MemoryStore;
