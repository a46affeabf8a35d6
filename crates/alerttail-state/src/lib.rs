//! Watermark persistence for the alerttail watch engine.
//!
//! Provides the [`StateIo`] capability (open persisted state for reading,
//! open a sink for writing), a file-backed [`FileStateIo`], an in-memory
//! [`MemoryStateIo`] for tests, and the [`WatermarkStore`] that holds the
//! single "last fetch time" boundary between runs.

#![warn(clippy::pedantic)]

pub mod error;
pub mod file;
pub mod io;
pub mod memory;
pub mod store;

pub use error::StateError;
pub use file::FileStateIo;
pub use io::{StateIo, StateSink};
pub use memory::MemoryStateIo;
pub use store::{LoadOutcome, WatermarkStore};
