//! Watch run result types.

use chrono::{DateTime, Utc};

use crate::cycle::{CycleOutcome, CycleReport};

/// Aggregate counters for a finished watch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchSummary {
    /// Fetch cycles admitted, the startup cycle included.
    pub cycles_started: u64,
    /// Ticks that found a cycle still running.
    pub ticks_dropped: u64,
    /// Cycles that ended on an alert source failure.
    pub cycles_failed: u64,
    pub windows_committed: u64,
    /// Alerts queued on the alert stream.
    pub alerts_forwarded: u64,
    /// Alerts the encoder wrote to the output.
    pub alerts_written: u64,
    /// Watermark at shutdown (what was saved).
    pub final_watermark: Option<DateTime<Utc>>,
}

impl WatchSummary {
    pub(crate) fn record_cycle(&mut self, report: &CycleReport) {
        self.windows_committed += report.windows_committed;
        self.alerts_forwarded += report.alerts_forwarded;
        if report.outcome == CycleOutcome::SourceFailed {
            self.cycles_failed += 1;
        }
    }
}
