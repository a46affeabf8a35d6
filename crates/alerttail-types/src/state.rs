//! Persisted watch state.
//!
//! The on-disk shape is a single JSON object:
//! `{"lastFetchTime": "2026-01-15T10:00:00.123456789Z"}`.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Snapshot of the watermark as persisted between runs.
///
/// `last_fetch_time` is the exclusive lower bound of the next query window.
/// `None` means no prior watermark: the first window bootstraps from the
/// trigger time instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchState {
    #[serde(
        default,
        deserialize_with = "deserialize_fetch_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_fetch_time: Option<DateTime<Utc>>,
}

impl WatchState {
    #[must_use]
    pub fn new(last_fetch_time: Option<DateTime<Utc>>) -> Self {
        Self { last_fetch_time }
    }
}

/// Accepts a timestamp, `null`, or the year-one zero timestamp
/// (`0001-01-01T00:00:00Z`) written by older state files; the latter two
/// both mean "unset".
fn deserialize_fetch_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<DateTime<Utc>>::deserialize(deserializer)?;
    Ok(value.filter(|t| t.year() > 1))
}
