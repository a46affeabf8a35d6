//! Shared alerttail data types.
//!
//! Pure data only: alert records produced by an alert source, the persisted
//! watch state record, query windows with their filter rendering, and the
//! alert source error model. No I/O lives here.

#![warn(clippy::pedantic)]

pub mod alert;
pub mod error;
pub mod state;
pub mod window;

pub use alert::{Alert, AlertComment};
pub use error::{ApiErrorBody, SourceError};
pub use state::WatchState;
pub use window::QueryWindow;
