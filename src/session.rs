//! Completed kick-counting sessions and their on-disk record format.

use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Kicks required before a session can be saved
pub const KICK_TARGET: u8 = 10;

/// One completed counting session, as stored in the session log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    /// Save time, RFC 3339 UTC with milliseconds
    pub date: String,
    pub minutes: u64,
    pub kicks: u32,
}

impl Session {
    /// Build the record for a session saved at `saved_at` after
    /// `elapsed_seconds` of counting.
    pub fn completed(saved_at: DateTime<Utc>, elapsed_seconds: u64) -> Self {
        Self {
            id: id_from_timestamp(saved_at),
            date: saved_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            minutes: minutes_for(elapsed_seconds),
            kicks: u32::from(KICK_TARGET),
        }
    }

    /// Parse `date`; `None` for records written with an unreadable timestamp
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date)
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }

    /// One line of the past-records list, e.g. `Mon Oct 19 2026  12 mins`.
    /// The day is the user's local calendar day.
    pub fn list_line(&self) -> String {
        let day = self
            .timestamp()
            .map(local_day)
            .unwrap_or_else(|| "Invalid Date".to_string());
        let minutes = self.minutes.max(1);
        let unit = if minutes == 1 { "min" } else { "mins" };
        format!("{}  {} {}", day, minutes, unit)
    }
}

/// Whole minutes reported for a session, never less than one
pub fn minutes_for(elapsed_seconds: u64) -> u64 {
    elapsed_seconds.div_ceil(60).max(1)
}

/// Session id: milliseconds since the Unix epoch
pub fn id_from_timestamp(at: DateTime<Utc>) -> String {
    at.timestamp_millis().to_string()
}

/// Local calendar day of `at`, e.g. `Mon Oct 19 2026`
pub fn local_day(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%a %b %d %Y").to_string()
}

/// Elapsed time as `MM:SS`; minutes are not wrapped at an hour
pub fn format_elapsed(elapsed_seconds: u64) -> String {
    format!("{:02}:{:02}", elapsed_seconds / 60, elapsed_seconds % 60)
}
