//! Watch engine for alerttail.
//!
//! Polls an [`AlertSource`] on a timer, turns the persisted watermark and the
//! trigger time into bounded query windows, streams newly observed alerts
//! through a bounded channel to a single encoder, and advances the watermark
//! only after a window's alerts are queued for output.

#![warn(clippy::pedantic)]

pub mod admission;
pub mod clock;
pub mod config;
pub mod cycle;
pub mod encoder;
pub mod errors;
pub mod planner;
pub mod result;
pub mod source;
pub mod watcher;

// Re-export public API for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::WatchConfig;
pub use cycle::{CycleOutcome, CycleReport};
pub use encoder::AlertEncoder;
pub use errors::WatchError;
pub use planner::{plan_window, Plan, WindowBounds};
pub use result::WatchSummary;
pub use source::AlertSource;
pub use watcher::Watcher;
