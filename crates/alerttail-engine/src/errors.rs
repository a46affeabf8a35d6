//! Watch engine error model.
//!
//! Only configuration and output failures surface from a watch run. Alert
//! source failures are absorbed by the fetch cycle (logged, retried at the
//! next tick) and watermark save failures are logged at shutdown.

/// Fatal errors returned by [`Watcher::run`](crate::Watcher::run).
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// Invalid watch configuration; raised before any task or timer starts.
    #[error("invalid watch configuration: {0}")]
    Config(String),

    /// Writing to the output sink failed.
    #[error("output write failed: {0}")]
    Output(#[from] std::io::Error),

    /// An alert could not be serialized.
    #[error("alert serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A spawned engine task panicked or was aborted.
    #[error("watch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl WatchError {
    /// Whether this error originated from the output side (encoder).
    #[must_use]
    pub fn is_output_failure(&self) -> bool {
        matches!(self, Self::Output(_) | Self::Serialize(_))
    }
}
