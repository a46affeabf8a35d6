//! Single-slot admission guard for fetch cycles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// At most one holder at a time. Acquisition never waits: a busy slot
/// means the caller skips its turn.
#[derive(Debug, Default)]
pub struct AdmissionSlot {
    busy: AtomicBool,
}

impl AdmissionSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot if it is free.
    ///
    /// The returned permit frees the slot when dropped, whichever way the
    /// holder exits.
    #[must_use]
    pub fn try_acquire(self: &Arc<Self>) -> Option<SlotPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SlotPermit {
                slot: Arc::clone(self),
            })
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof of holding the [`AdmissionSlot`].
#[derive(Debug)]
pub struct SlotPermit {
    slot: Arc<AdmissionSlot>,
}

impl Drop for SlotPermit {
    fn drop(&mut self) {
        self.slot.busy.store(false, Ordering::Release);
    }
}
