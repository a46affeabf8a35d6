//! In-memory [`StateIo`] (for tests and ephemeral runs).

use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error;
use crate::io::{StateIo, StateSink};

/// State held in a shared byte buffer.
///
/// Clones share the same buffer, so a test can keep one handle and give
/// another to the engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateIo {
    content: Arc<Mutex<Option<Vec<u8>>>>,
}

impl MemoryStateIo {
    /// Empty store: nothing persisted yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `bytes`.
    #[must_use]
    pub fn with_content(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            content: Arc::new(Mutex::new(Some(bytes.into()))),
        }
    }

    /// Snapshot of the persisted bytes, if any.
    #[must_use]
    pub fn content(&self) -> Option<Vec<u8>> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Vec<u8>>> {
        self.content.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StateIo for MemoryStateIo {
    fn open_read(&self) -> error::Result<Option<Box<dyn Read + Send + '_>>> {
        Ok(self
            .content()
            .map(|bytes| Box::new(Cursor::new(bytes)) as Box<dyn Read + Send>))
    }

    fn open_write(&self) -> error::Result<Box<dyn StateSink + '_>> {
        Ok(Box::new(MemorySink {
            buf: Vec::new(),
            target: self,
        }))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

struct MemorySink<'a> {
    buf: Vec<u8>,
    target: &'a MemoryStateIo,
}

impl Write for MemorySink<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl StateSink for MemorySink<'_> {
    fn commit(self: Box<Self>) -> error::Result<()> {
        let MemorySink { buf, target } = *self;
        *target.lock() = Some(buf);
        Ok(())
    }
}
