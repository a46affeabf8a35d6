//! The alert source seam.

use alerttail_types::{Alert, SourceError};
use async_trait::async_trait;

/// Lists alerts matching a filter expression.
///
/// Cancellation is handled by the caller dropping the returned future, so
/// implementations must tolerate being dropped at any await point.
#[async_trait]
pub trait AlertSource: Send + Sync {
    /// Return every alert matching `filter`, in retrieval order.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] for transport, authentication, API, or
    /// decoding failures.
    async fn list(&self, filter: &str) -> Result<Vec<Alert>, SourceError>;
}
