//! The watermark: the single persisted "last fetch time" boundary.

use std::io::{Read, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

use alerttail_types::WatchState;
use chrono::{DateTime, Utc};

use crate::error::{self, StateError};
use crate::io::StateIo;

/// Result of a successful [`WatermarkStore::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A persisted watermark was found and is now current.
    Restored(DateTime<Utc>),
    /// Nothing usable was persisted (absent, empty, or explicitly unset).
    Fresh,
}

/// In-memory watermark with load/save against a [`StateIo`].
///
/// Only the active fetch cycle mutates the value; the lock exists so the
/// store can be shared across tasks, not to arbitrate between writers.
#[derive(Debug, Default)]
pub struct WatermarkStore {
    current: Mutex<Option<DateTime<Utc>>>,
}

impl WatermarkStore {
    /// Store with no watermark.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store starting at `watermark`.
    #[must_use]
    pub fn with_watermark(watermark: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(Some(watermark)),
        }
    }

    /// Current watermark, `None` when unset.
    #[must_use]
    pub fn get(&self) -> Option<DateTime<Utc>> {
        *self.lock()
    }

    /// Replace the current watermark.
    pub fn set(&self, watermark: DateTime<Utc>) {
        *self.lock() = Some(watermark);
    }

    /// Load the persisted watermark, replacing the in-memory value.
    ///
    /// Absent or blank state is not an error: the watermark is left unset
    /// and [`LoadOutcome::Fresh`] is returned. On any error the watermark
    /// is also left unset, so callers may log and carry on.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Io`] if existing state cannot be read, or
    /// [`StateError::Malformed`] if it is not a valid state record.
    pub fn load(&self, io: &dyn StateIo) -> error::Result<LoadOutcome> {
        *self.lock() = None;

        let Some(mut reader) = io.open_read()? else {
            return Ok(LoadOutcome::Fresh);
        };
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(LoadOutcome::Fresh);
        }

        let state: WatchState = serde_json::from_slice(&raw).map_err(StateError::Malformed)?;
        *self.lock() = state.last_fetch_time;
        Ok(state
            .last_fetch_time
            .map_or(LoadOutcome::Fresh, LoadOutcome::Restored))
    }

    /// Persist the current watermark (unset included) through `io`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if the record cannot be encoded, written, or
    /// committed.
    pub fn save(&self, io: &dyn StateIo) -> error::Result<()> {
        let state = WatchState::new(self.get());
        let mut bytes = serde_json::to_vec(&state).map_err(StateError::Encode)?;
        bytes.push(b'\n');

        let mut sink = io.open_write()?;
        sink.write_all(&bytes)?;
        sink.commit()?;
        tracing::debug!(
            location = %io.describe(),
            last_fetch_time = ?state.last_fetch_time,
            "Watermark saved"
        );
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Option<DateTime<Utc>>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
