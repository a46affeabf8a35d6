//! Read/write capability for persisted watch state.
//!
//! The store never names a concrete file: it is handed a [`StateIo`] and
//! asks it for a reader or a sink. That keeps the store usable against
//! files, in-memory buffers, or anything else that can hold a few bytes.

use std::io::{Read, Write};

use crate::error;

/// Factory pair for opening persisted state.
///
/// Implementations must be `Send + Sync` for use behind `Arc<dyn StateIo>`.
pub trait StateIo: Send + Sync {
    /// Open the persisted state for reading.
    ///
    /// Returns `Ok(None)` when nothing has been persisted yet.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`](crate::error::StateError) when existing state
    /// cannot be opened.
    fn open_read(&self) -> error::Result<Option<Box<dyn Read + Send + '_>>>;

    /// Open a sink whose contents replace the persisted state once
    /// [`StateSink::commit`] succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`](crate::error::StateError) if the sink cannot
    /// be created.
    fn open_write(&self) -> error::Result<Box<dyn StateSink + '_>>;

    /// Human-readable location for log lines.
    fn describe(&self) -> String;
}

/// Writable half of [`StateIo`]. Bytes written are not visible to readers
/// until `commit` is called; dropping the sink without committing discards
/// them.
pub trait StateSink: Write + Send {
    /// Make the written bytes the new persisted state.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`](crate::error::StateError) on flush or
    /// publication failure.
    fn commit(self: Box<Self>) -> error::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traits_are_object_safe() {
        fn _assert_io(_: &dyn StateIo) {}
        fn _assert_sink(_: &dyn StateSink) {}
    }
}
