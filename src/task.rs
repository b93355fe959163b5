//! Task data structure and related functionality.
//!
//! A `Task` is a single tracked unit of work. Its id and creation time are fixed
//! at construction; every mutation goes through a method that refreshes `updated`.

use chrono::{Local, NaiveDateTime, SubsecRound, Timelike};
use serde::{Deserialize, Serialize};

use crate::fields::Status;

/// A single work item as stored in the task file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub description: String,
    pub status: Status,
    #[serde(with = "iso_timestamp")]
    pub created: NaiveDateTime,
    #[serde(with = "iso_timestamp")]
    pub updated: NaiveDateTime,
}

impl Task {
    /// Create a `todo` task stamped with `now` for both timestamps.
    pub fn new(id: u64, description: String, now: NaiveDateTime) -> Self {
        Self {
            id,
            description,
            status: Status::Todo,
            created: now,
            updated: now,
        }
    }

    pub fn set_description(&mut self, description: String, now: NaiveDateTime) {
        self.description = description;
        self.touch(now);
    }

    pub fn set_status(&mut self, status: Status, now: NaiveDateTime) {
        self.status = status;
        self.touch(now);
    }

    // Never moves backwards, even if the wall clock does.
    fn touch(&mut self, now: NaiveDateTime) {
        self.updated = self.updated.max(now);
    }
}

/// Current local time at microsecond precision.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(6)
}

/// Render a timestamp in ISO-8601 form: `2024-05-01T09:30:00` on a whole
/// second, otherwise always six fractional digits (`2024-05-01T09:30:00.250000`).
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    if ts.nanosecond() == 0 {
        ts.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        ts.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// Task file timestamps, written with `format_timestamp`.
mod iso_timestamp {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
