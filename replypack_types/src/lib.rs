use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One line of a crawled log file: every message posted on a single day.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct LogDay {
    pub data: Vec<RawRecord>,
}

/// A message exactly as the archive serves it.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RawRecord {
    /// Integer id, sometimes delivered as a string.
    pub id: Value,
    pub text: String,
    /// Zoned timestamp, e.g. `2016-04-01T12:30:00+03:00`.
    pub time: String,
    pub user_id: Value,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Message {
    pub id: i64,
    pub text: String,
    pub author_id: Value,
    pub timestamp: DateTime<Utc>,
    pub parent_ids: Vec<i64>,
}

impl Message {
    /// Flood bucket key: whole minutes since the epoch.
    pub fn minute_key(&self) -> i64 {
        self.timestamp.timestamp().div_euclid(60)
    }

    pub fn has_parents(&self) -> bool {
        !self.parent_ids.is_empty()
    }
}

/// One message of a training sample as written to a pack.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Turn {
    pub body: String,
    pub processed_body: String,
    pub author: Value,
}

/// Oldest turn first.
pub type Sample = Vec<Turn>;

/// Drop sub-second precision; messages are compared at second resolution.
pub fn truncate_to_second(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_nanosecond(0).unwrap_or(ts)
}
