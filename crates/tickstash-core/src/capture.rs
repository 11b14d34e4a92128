//! Capture clock for documents.
//!
//! Documents are stamped with the time the bridge received the event, not
//! the simulation tick. One [`Capture`] is taken per received event, so
//! every document produced from the same event shares the same timestamp
//! and destination date.
//!
//! The timestamp is UTC; the destination date is the calendar date in the
//! process's local timezone. Near midnight the two can disagree on the day.

use chrono::{DateTime, Local, NaiveDate, SecondsFormat, Utc};
use serde_json::{Map, Value};

/// Body field holding the capture timestamp.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// The moment one event was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capture {
    /// Wall-clock capture time.
    timestamp: DateTime<Utc>,
    /// Local calendar date used for destination partitioning.
    date: NaiveDate,
}

impl Capture {
    /// Capture the current process time.
    pub fn now() -> Self {
        let timestamp = Utc::now();
        Self {
            timestamp,
            date: timestamp.with_timezone(&Local).date_naive(),
        }
    }

    /// Capture at an explicit time and local date.
    pub const fn at(timestamp: DateTime<Utc>, date: NaiveDate) -> Self {
        Self { timestamp, date }
    }

    /// Capture time as an ISO-8601 string with millisecond precision
    /// (`2026-10-19T08:15:00.123Z`).
    pub fn timestamp(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Local calendar date of the capture.
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Stamp `body` with the capture timestamp, replacing any existing
    /// `timestamp` field.
    pub(crate) fn stamp(&self, body: &mut Map<String, Value>) {
        body.insert(TIMESTAMP_FIELD.to_owned(), Value::String(self.timestamp()));
    }
}
