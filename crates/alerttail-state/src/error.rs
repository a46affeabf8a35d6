//! Watermark state error types.

/// Errors produced while loading or saving watch state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// File-system or sink I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted content exists but is not a valid state record.
    #[error("malformed state: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The state record could not be serialized.
    #[error("state encode error: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, StateError>;
