use chrono::{DateTime, Utc};
use serde_json::Value;

/// A submission whose status and name are both present.
///
/// `status` holds the raw code as sent by the server; a non-string code is
/// kept in its JSON rendering so the verdict lookup can reject it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub status: String,
    pub homework_name: String,
}

/// A validated poll response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PollResponse {
    /// Raw submission records updated since the requested cursor, newest
    /// first. Entries are not inspected until one is mapped.
    pub homeworks: Vec<Value>,
    /// Server time of the response, used to advance the cursor.
    pub current_date: Option<i64>,
}

/// Lower bound (Unix seconds) of the next poll window.
///
/// Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor(i64);

impl Cursor {
    pub fn new(timestamp: i64) -> Self {
        Self(timestamp)
    }

    /// Cursor positioned at the current wall-clock time.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.timestamp())
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Move the cursor to `timestamp` if that is later than the current value.
    /// Returns whether the cursor moved.
    pub fn advance(&mut self, timestamp: i64) -> bool {
        if timestamp > self.0 {
            self.0 = timestamp;
            true
        } else {
            false
        }
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
