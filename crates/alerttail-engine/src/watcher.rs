//! The scheduler: drives fetch cycles on a timer and owns the alert stream.

use std::sync::Arc;

use alerttail_state::{LoadOutcome, StateError, StateIo, WatermarkStore};
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::admission::AdmissionSlot;
use crate::clock::{Clock, SystemClock};
use crate::config::WatchConfig;
use crate::cycle::{CycleReport, FetchCycle};
use crate::encoder::AlertEncoder;
use crate::errors::WatchError;
use crate::planner::WindowBounds;
use crate::result::WatchSummary;
use crate::source::AlertSource;

/// Long-running alert watch.
///
/// Lifecycle of [`Watcher::run`]: validate config, load the watermark,
/// start the encoder, run one cycle immediately and then one per tick
/// (dropping ticks while a cycle is active), and on shutdown drain the
/// stream and save the watermark.
pub struct Watcher {
    config: WatchConfig,
    source: Arc<dyn AlertSource>,
    clock: Arc<dyn Clock>,
    state: Option<Arc<dyn StateIo>>,
    store: Arc<WatermarkStore>,
}

impl Watcher {
    #[must_use]
    pub fn new(config: WatchConfig, source: Arc<dyn AlertSource>) -> Self {
        Self {
            config,
            source,
            clock: Arc::new(SystemClock),
            state: None,
            store: Arc::new(WatermarkStore::new()),
        }
    }

    /// Use `clock` for trigger times.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Load the watermark from `state` at startup and save it back at
    /// shutdown. Without state the watermark lives only in memory.
    #[must_use]
    pub fn with_state(mut self, state: Arc<dyn StateIo>) -> Self {
        self.state = Some(state);
        self
    }

    /// Share an existing watermark store instead of a fresh one.
    #[must_use]
    pub fn with_watermark_store(mut self, store: Arc<WatermarkStore>) -> Self {
        self.store = store;
        self
    }

    /// Handle to the watermark this watcher advances.
    #[must_use]
    pub fn watermark(&self) -> Arc<WatermarkStore> {
        Arc::clone(&self.store)
    }

    /// Run until `shutdown` is cancelled or the output fails.
    ///
    /// Cancelling `shutdown` interrupts the active cycle, but alerts already
    /// on the stream are still written before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Config`] before anything starts if the config
    /// is out of bounds, and an output or task error if the encoder or a
    /// cycle fails. Alert source and watermark save failures are logged,
    /// never returned.
    pub async fn run<W>(
        self,
        output: W,
        shutdown: CancellationToken,
    ) -> Result<WatchSummary, WatchError>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        self.config.validate()?;

        if let Some(state) = &self.state {
            self.load_state(state.as_ref());
        }

        let cancel = shutdown.child_token();
        let (tx, rx) = mpsc::channel(self.config.channel_capacity);

        let encoder_cancel = cancel.clone();
        let indent = self.config.indent_output;
        let encoder = tokio::spawn(async move {
            let result = AlertEncoder::new(output, indent).drain(rx).await;
            if let Err(ref err) = result {
                tracing::error!("Output failed, stopping watch: {err}");
                encoder_cancel.cancel();
            }
            result
        });

        let template = FetchCycle {
            source: Arc::clone(&self.source),
            store: Arc::clone(&self.store),
            tx,
            bounds: WindowBounds::from(&self.config),
            filter_field: self.config.filter_field.clone(),
            cancel: cancel.clone(),
        };
        let slot = Arc::new(AdmissionSlot::new());
        let mut cycles: JoinSet<CycleReport> = JoinSet::new();
        let mut summary = WatchSummary::default();
        let mut fatal: Option<WatchError> = None;

        tracing::info!(
            ticker_interval_secs = self.config.ticker_interval.as_secs(),
            max_interval_secs = self.config.max_interval.as_secs(),
            watermark = ?self.store.get(),
            "Watch started"
        );

        if admit(&slot, &template, self.clock.now(), &mut cycles) {
            summary.cycles_started += 1;
        }

        let period = self.config.ticker_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                Some(joined) = cycles.join_next(), if !cycles.is_empty() => {
                    match joined {
                        Ok(report) => summary.record_cycle(&report),
                        Err(err) => {
                            tracing::error!("Fetch cycle task failed: {err}");
                            if fatal.is_none() {
                                fatal = Some(err.into());
                            }
                            cancel.cancel();
                        }
                    }
                }
                _ = ticker.tick() => {
                    let trigger = self.clock.now();
                    if admit(&slot, &template, trigger, &mut cycles) {
                        summary.cycles_started += 1;
                        tracing::debug!(trigger = %trigger, "Fetch cycle started");
                    } else {
                        summary.ticks_dropped += 1;
                        tracing::debug!(trigger = %trigger, "Fetch cycle still running, tick dropped");
                    }
                }
            }
        }

        drop(ticker);
        while let Some(joined) = cycles.join_next().await {
            match joined {
                Ok(report) => summary.record_cycle(&report),
                Err(err) => {
                    tracing::error!("Fetch cycle task failed: {err}");
                    if fatal.is_none() {
                        fatal = Some(err.into());
                    }
                }
            }
        }

        // Last sender; closing it lets the encoder finish the drain.
        drop(template);
        match encoder.await {
            Ok(Ok(written)) => summary.alerts_written = written,
            Ok(Err(err)) => fatal = Some(err),
            Err(err) => fatal = Some(err.into()),
        }

        summary.final_watermark = self.store.get();
        if let Some(state) = &self.state {
            if let Err(err) = self.store.save(state.as_ref()) {
                tracing::error!(
                    location = %state.describe(),
                    "Failed to save watermark: {err}"
                );
            }
        }

        tracing::info!(
            cycles_started = summary.cycles_started,
            ticks_dropped = summary.ticks_dropped,
            cycles_failed = summary.cycles_failed,
            windows_committed = summary.windows_committed,
            alerts_written = summary.alerts_written,
            watermark = ?summary.final_watermark,
            "Watch stopped"
        );

        match fatal {
            Some(err) => Err(err),
            None => Ok(summary),
        }
    }

    fn load_state(&self, io: &dyn StateIo) {
        match self.store.load(io) {
            Ok(LoadOutcome::Restored(watermark)) => {
                tracing::info!(location = %io.describe(), watermark = %watermark, "Watermark restored");
            }
            Ok(LoadOutcome::Fresh) => {
                tracing::info!(location = %io.describe(), "No saved watermark, starting fresh");
            }
            Err(StateError::Malformed(err)) => {
                tracing::warn!(
                    location = %io.describe(),
                    "Saved watermark is malformed, starting fresh: {err}"
                );
            }
            Err(err) => {
                tracing::warn!(
                    location = %io.describe(),
                    "Failed to read saved watermark, starting fresh: {err}"
                );
            }
        }
    }
}

/// Spawn a cycle if the slot is free. Returns whether one was spawned.
fn admit(
    slot: &Arc<AdmissionSlot>,
    template: &FetchCycle,
    trigger: chrono::DateTime<chrono::Utc>,
    cycles: &mut JoinSet<CycleReport>,
) -> bool {
    match slot.try_acquire() {
        Some(permit) => {
            cycles.spawn(template.clone().run(trigger, permit));
            true
        }
        None => false,
    }
}
