//! Query window planning.
//!
//! Pure arithmetic over the watermark, the trigger time and the two quota
//! bounds. The fetch cycle calls [`plan_window`] in a loop, committing each
//! window's `end` as the new watermark before asking for the next one.

use std::time::Duration;

use alerttail_types::QueryWindow;
use chrono::{DateTime, TimeDelta, Utc};

use crate::config::WatchConfig;

/// Smallest span the planner will work with.
const MIN_SPAN: TimeDelta = TimeDelta::milliseconds(1);

/// Span limits applied to every planned window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    max_interval: TimeDelta,
    max_look_behind: TimeDelta,
}

impl WindowBounds {
    /// Build bounds from std durations. Spans below one millisecond are
    /// raised to one millisecond, so every window makes progress.
    #[must_use]
    pub fn new(max_interval: Duration, max_look_behind: Duration) -> Self {
        Self {
            max_interval: to_delta(max_interval),
            max_look_behind: to_delta(max_look_behind),
        }
    }

    #[must_use]
    pub fn max_interval(&self) -> TimeDelta {
        self.max_interval
    }

    #[must_use]
    pub fn max_look_behind(&self) -> TimeDelta {
        self.max_look_behind
    }
}

impl From<&WatchConfig> for WindowBounds {
    fn from(config: &WatchConfig) -> Self {
        Self::new(config.max_interval, config.max_look_behind)
    }
}

fn to_delta(d: Duration) -> TimeDelta {
    TimeDelta::from_std(d).unwrap_or(TimeDelta::MAX).max(MIN_SPAN)
}

/// Outcome of one planning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// The watermark has reached the trigger time; nothing left to query.
    CaughtUp,
    /// Query this window next.
    Query {
        window: QueryWindow,
        /// The start was moved forward to respect the look-behind quota;
        /// data between the old watermark and `window.start` is skipped.
        look_behind_clipped: bool,
    },
}

/// Plan the next query window for `watermark` up to `trigger`.
///
/// * An unset watermark starts one `max_interval` before the trigger.
/// * A watermark at or past the trigger is [`Plan::CaughtUp`].
/// * A start older than `trigger - max_look_behind` is clipped to it.
/// * The window ends at `trigger` or `start + max_interval`, whichever is
///   earlier, so `start < end <= trigger` always holds for a query.
#[must_use]
pub fn plan_window(
    watermark: Option<DateTime<Utc>>,
    trigger: DateTime<Utc>,
    bounds: WindowBounds,
) -> Plan {
    let mut start = watermark.unwrap_or_else(|| sub_saturating(trigger, bounds.max_interval));
    if start >= trigger {
        return Plan::CaughtUp;
    }

    let oldest = sub_saturating(trigger, bounds.max_look_behind);
    let look_behind_clipped = start < oldest;
    if look_behind_clipped {
        start = oldest;
    }

    let end = start
        .checked_add_signed(bounds.max_interval)
        .map_or(trigger, |capped| capped.min(trigger));

    Plan::Query {
        window: QueryWindow::new(start, end),
        look_behind_clipped,
    }
}

fn sub_saturating(ts: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    ts.checked_sub_signed(delta).unwrap_or(DateTime::<Utc>::MIN_UTC)
}
