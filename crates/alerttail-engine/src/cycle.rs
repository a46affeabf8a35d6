//! One catch-up pass from the watermark up to a trigger time.

use std::sync::Arc;

use alerttail_state::WatermarkStore;
use alerttail_types::{Alert, QueryWindow};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::admission::SlotPermit;
use crate::planner::{plan_window, Plan, WindowBounds};
use crate::source::AlertSource;

/// How a fetch cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The watermark reached the trigger time.
    CaughtUp,
    /// The alert source failed; the next tick resumes from the watermark.
    SourceFailed,
    /// Shutdown was requested mid-cycle.
    Cancelled,
    /// The encoder is gone; nothing more can be delivered.
    OutputClosed,
}

/// Counters for a finished cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    pub windows_committed: u64,
    pub alerts_forwarded: u64,
}

/// Everything a fetch cycle needs, cloned per cycle by the watcher.
#[derive(Clone)]
pub struct FetchCycle {
    pub(crate) source: Arc<dyn AlertSource>,
    pub(crate) store: Arc<WatermarkStore>,
    pub(crate) tx: mpsc::Sender<Alert>,
    pub(crate) bounds: WindowBounds,
    pub(crate) filter_field: String,
    pub(crate) cancel: CancellationToken,
}

impl FetchCycle {
    /// Query window after window until caught up with `trigger`.
    ///
    /// The watermark moves to a window's end only once every alert of that
    /// window has been queued for output. Holding `permit` for the whole
    /// call keeps other cycles out; it is released on every exit path.
    pub async fn run(self, trigger: DateTime<Utc>, permit: SlotPermit) -> CycleReport {
        let _permit = permit;
        let mut report = CycleReport {
            outcome: CycleOutcome::CaughtUp,
            windows_committed: 0,
            alerts_forwarded: 0,
        };

        loop {
            let (window, look_behind_clipped) =
                match plan_window(self.store.get(), trigger, self.bounds) {
                    Plan::CaughtUp => break,
                    Plan::Query {
                        window,
                        look_behind_clipped,
                    } => (window, look_behind_clipped),
                };
            if look_behind_clipped {
                tracing::debug!(
                    watermark = ?self.store.get(),
                    window = %window,
                    "Watermark is older than the look-behind quota, older alerts are skipped"
                );
            }

            let alerts = match self.query(&window).await {
                Ok(alerts) => alerts,
                Err(outcome) => {
                    report.outcome = outcome;
                    break;
                }
            };

            match self.forward(alerts, &mut report).await {
                Ok(()) => {
                    self.store.set(window.end);
                    report.windows_committed += 1;
                    tracing::debug!(
                        window = %window,
                        alerts_forwarded = report.alerts_forwarded,
                        "Window committed"
                    );
                }
                Err(outcome) => {
                    report.outcome = outcome;
                    break;
                }
            }
        }

        report
    }

    async fn query(&self, window: &QueryWindow) -> Result<Vec<Alert>, CycleOutcome> {
        let filter = window.filter(&self.filter_field);
        tracing::debug!(window = %window, filter = %filter, "Listing alerts");

        let result = tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                tracing::debug!(window = %window, "Alert listing cancelled");
                return Err(CycleOutcome::Cancelled);
            }
            result = self.source.list(&filter) => result,
        };

        result.map_err(|err| {
            tracing::error!(
                kind = err.kind(),
                retryable = err.is_retryable(),
                window = %window,
                "Alert listing failed, retrying on next tick: {err}"
            );
            CycleOutcome::SourceFailed
        })
    }

    async fn forward(
        &self,
        alerts: Vec<Alert>,
        report: &mut CycleReport,
    ) -> Result<(), CycleOutcome> {
        for alert in alerts {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    tracing::debug!("Alert forwarding cancelled before window commit");
                    return Err(CycleOutcome::Cancelled);
                }
                sent = self.tx.send(alert) => {
                    if sent.is_err() {
                        tracing::debug!("Alert stream closed, abandoning window");
                        return Err(CycleOutcome::OutputClosed);
                    }
                    report.alerts_forwarded += 1;
                }
            }
        }
        Ok(())
    }
}
