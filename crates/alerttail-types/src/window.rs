//! Half-open query windows and their filter expression rendering.

use std::fmt;

use chrono::{DateTime, Duration, Timelike, Utc};

/// Default alert field the window bounds are applied to.
pub const DEFAULT_FILTER_FIELD: &str = "alertCreationTime";

/// A half-open time range `(start, end]`.
///
/// The lower bound is exclusive so that a record sitting exactly on the
/// boundary of the previous window is not delivered twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl QueryWindow {
    #[must_use]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Width of the window.
    #[must_use]
    pub fn span(&self) -> Duration {
        self.end - self.start
    }

    /// Render the window as a filter expression over `field`:
    /// `<field> gt <start> and <field> le <end>`.
    #[must_use]
    pub fn filter(&self, field: &str) -> String {
        format!(
            "{field} gt {} and {field} le {}",
            format_filter_time(self.start),
            format_filter_time(self.end),
        )
    }
}

impl fmt::Display for QueryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}]",
            format_filter_time(self.start),
            format_filter_time(self.end)
        )
    }
}

/// Format a timestamp for a filter literal: UTC, second resolution plus up
/// to five fractional digits with trailing zeros dropped, `Z` suffix.
///
/// The fraction is truncated, never rounded, so a rendered bound never
/// lands after the instant it stands for.
#[must_use]
pub fn format_filter_time(ts: DateTime<Utc>) -> String {
    let mut out = ts.format("%Y-%m-%dT%H:%M:%S").to_string();
    // Leap-second nanos (>= 1e9) clamp to the last representable fraction.
    let nanos = ts.nanosecond().min(999_999_999);
    let fraction = nanos / 10_000;
    if fraction > 0 {
        let digits = format!("{fraction:05}");
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out.push('Z');
    out
}
