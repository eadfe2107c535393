use crate::clock::Clock;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Append-only JSONL record of what happened on recording screens.
/// One line per event; never read back by the application.
pub struct Journal {
    pub path: PathBuf,
    file: File,
    clock: Arc<dyn Clock>,
}

#[derive(Serialize)]
struct Entry<'a> {
    ts: DateTime<Utc>,
    #[serde(rename = "type")]
    event_type: &'a str,
    #[serde(flatten)]
    data: serde_json::Value,
}

impl Journal {
    pub fn open(path: &Path, clock: Arc<dyn Clock>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            clock,
        })
    }

    pub fn log(&mut self, event_type: &str, data: serde_json::Value) -> Result<()> {
        let entry = Entry {
            ts: self.clock.now(),
            event_type,
            data,
        };
        let line = serde_json::to_string(&entry)?;
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;
        Ok(())
    }

    pub fn started(&mut self, elapsed_seconds: u64, kicks: u8) -> Result<()> {
        self.log(
            "started",
            serde_json::json!({ "elapsed_seconds": elapsed_seconds, "kicks": kicks }),
        )
    }

    pub fn paused(&mut self, elapsed_seconds: u64, kicks: u8) -> Result<()> {
        self.log(
            "paused",
            serde_json::json!({ "elapsed_seconds": elapsed_seconds, "kicks": kicks }),
        )
    }

    pub fn kick(&mut self, elapsed_seconds: u64, kicks: u8) -> Result<()> {
        self.log(
            "kick",
            serde_json::json!({ "elapsed_seconds": elapsed_seconds, "kicks": kicks }),
        )
    }

    /// Target reached, timer stopped on its own
    pub fn completed(&mut self, elapsed_seconds: u64) -> Result<()> {
        self.log(
            "completed",
            serde_json::json!({ "elapsed_seconds": elapsed_seconds }),
        )
    }

    pub fn saved(&mut self, id: &str, minutes: u64) -> Result<()> {
        self.log(
            "saved",
            serde_json::json!({ "id": id, "minutes": minutes }),
        )
    }

    pub fn save_failed(&mut self, error: &str) -> Result<()> {
        self.log("save_failed", serde_json::json!({ "error": error }))
    }

    /// Left the recording screen with unsaved progress
    pub fn discarded(&mut self, elapsed_seconds: u64, kicks: u8) -> Result<()> {
        self.log(
            "discarded",
            serde_json::json!({ "elapsed_seconds": elapsed_seconds, "kicks": kicks }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap(),
        ))
    }

    #[test]
    fn test_lines_are_json_with_type() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal").join("2026-10-19.jsonl");
        let clock = clock();
        let mut journal = Journal::open(&path, clock.clone()).unwrap();

        journal.started(0, 0).unwrap();
        clock.advance(Duration::seconds(12));
        journal.kick(12, 1).unwrap();
        journal.saved("1792397700000", 3).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["type"], "started");
        assert_eq!(lines[1]["type"], "kick");
        assert_eq!(lines[1]["kicks"], 1);
        assert_eq!(lines[2]["id"], "1792397700000");
        assert_eq!(lines[0]["ts"], "2026-10-19T08:00:00Z");
        assert_eq!(lines[1]["ts"], "2026-10-19T08:00:12Z");
    }

    #[test]
    fn test_reopen_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("j.jsonl");

        Journal::open(&path, clock()).unwrap().paused(5, 0).unwrap();
        Journal::open(&path, clock()).unwrap().discarded(5, 0).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
