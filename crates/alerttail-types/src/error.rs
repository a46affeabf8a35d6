//! Error model for alert source operations.

use std::fmt;

/// Structured error body returned by the alerts API on non-2xx responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub target: String,
}

impl fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if !self.target.is_empty() {
            write!(f, " (target: {})", self.target)?;
        }
        Ok(())
    }
}

/// Failure of a single alert source call.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP client failure (connect, timeout, reset, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The API answered with an error status and a structured body.
    #[error("api error (status {status}): {body}")]
    Api { status: u16, body: ApiErrorBody },

    /// Token acquisition failed.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl SourceError {
    /// Stable label for log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Api { .. } => "api",
            Self::Auth(_) => "auth",
            Self::Decode(_) => "decode",
        }
    }

    /// Whether the next scheduled attempt can reasonably succeed without
    /// operator intervention.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Auth(_) | Self::Decode(_) => false,
        }
    }
}
