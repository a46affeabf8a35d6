//! Configuration types: the YAML file schema and the engine's typed
//! [`WatchConfig`].

use std::time::Duration;

use alerttail_types::window::DEFAULT_FILTER_FIELD;
use serde::Deserialize;

use crate::errors::WatchError;

/// Lower bound for the scheduler tick period.
pub const MIN_TICKER_INTERVAL: Duration = Duration::from_secs(3);
/// Upper bound for the scheduler tick period.
pub const MAX_TICKER_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
/// Lower bound for a single query window's span.
pub const MIN_MAX_INTERVAL: Duration = Duration::from_secs(1);
/// Upper bound for a single query window's span.
pub const MAX_MAX_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
/// Oldest data the alerts API lets a query reach back to.
pub const QUOTA_MAX_LOOK_BEHIND: Duration = Duration::from_secs(30 * 24 * 60 * 60 - 1);

pub const DEFAULT_TICKER_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
pub const DEFAULT_API_BASE_URL: &str = "https://api.securitycenter.windows.com";
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Engine configuration
// ---------------------------------------------------------------------------

/// Tunables consumed by [`Watcher`](crate::Watcher), passed in at
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// Period between scheduler ticks.
    pub ticker_interval: Duration,
    /// Maximum span of a single query window.
    pub max_interval: Duration,
    /// Oldest point, relative to the trigger time, a window may start at.
    pub max_look_behind: Duration,
    /// Capacity of the bounded alert channel between fetch and encode.
    pub channel_capacity: usize,
    /// Alert field the window bounds filter on.
    pub filter_field: String,
    /// Pretty-print output records.
    pub indent_output: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            ticker_interval: DEFAULT_TICKER_INTERVAL,
            max_interval: MAX_MAX_INTERVAL,
            max_look_behind: QUOTA_MAX_LOOK_BEHIND,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            filter_field: DEFAULT_FILTER_FIELD.to_string(),
            indent_output: false,
        }
    }
}

impl WatchConfig {
    /// Every bound violation, in a stable order. Empty when valid.
    #[must_use]
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.ticker_interval < MIN_TICKER_INTERVAL || self.ticker_interval > MAX_TICKER_INTERVAL
        {
            problems.push(format!(
                "ticker interval {:?} is outside [{:?}, {:?}]",
                self.ticker_interval, MIN_TICKER_INTERVAL, MAX_TICKER_INTERVAL
            ));
        }
        if self.max_interval < MIN_MAX_INTERVAL || self.max_interval > MAX_MAX_INTERVAL {
            problems.push(format!(
                "max interval {:?} is outside [{:?}, {:?}]",
                self.max_interval, MIN_MAX_INTERVAL, MAX_MAX_INTERVAL
            ));
        }
        if self.max_look_behind < MIN_MAX_INTERVAL || self.max_look_behind > QUOTA_MAX_LOOK_BEHIND {
            problems.push(format!(
                "max look-behind {:?} is outside [{:?}, {:?}]",
                self.max_look_behind, MIN_MAX_INTERVAL, QUOTA_MAX_LOOK_BEHIND
            ));
        }
        if self.channel_capacity == 0 {
            problems.push("channel capacity must be > 0".to_string());
        }
        if self.filter_field.trim().is_empty() {
            problems.push("filter field must not be empty".to_string());
        }

        problems
    }

    /// Check the bounds the scheduler relies on.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Config`] listing every violated bound.
    pub fn validate(&self) -> Result<(), WatchError> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(WatchError::Config(problems.join("; ")))
        }
    }
}

// ---------------------------------------------------------------------------
// File configuration
// ---------------------------------------------------------------------------

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub credentials: Credentials,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub watch: WatchSettings,
}

/// OAuth2 client-credentials identity for the alerts API.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// HTTP endpoint settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Token endpoint; derived from the tenant when unset.
    #[serde(default)]
    pub token_url: Option<String>,
    /// OAuth resource the token is requested for; `base_url` when unset.
    #[serde(default)]
    pub resource: Option<String>,
    /// Version path segment, e.g. `v1.0` for `/api/v1.0/alerts`. The
    /// unversioned `/api/alerts` route is used when unset.
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_url: None,
            resource: None,
            version: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Watch tunables as written in the file. Converted to [`WatchConfig`]
/// with [`WatchSettings::to_watch_config`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSettings {
    #[serde(default = "default_ticker_interval_secs")]
    pub ticker_interval_secs: u64,
    #[serde(default = "default_max_interval_minutes")]
    pub max_interval_minutes: f64,
    #[serde(default = "default_max_look_behind_secs")]
    pub max_look_behind_secs: u64,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default = "default_filter_field")]
    pub filter_field: String,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            ticker_interval_secs: default_ticker_interval_secs(),
            max_interval_minutes: default_max_interval_minutes(),
            max_look_behind_secs: default_max_look_behind_secs(),
            channel_capacity: default_channel_capacity(),
            filter_field: default_filter_field(),
        }
    }
}

impl WatchSettings {
    /// Convert file units (seconds, fractional minutes) into a
    /// [`WatchConfig`]. Minutes are rounded to the millisecond; negative or
    /// non-finite minutes map to a zero interval, which validation then
    /// rejects.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_watch_config(&self, indent_output: bool) -> WatchConfig {
        let millis = self.max_interval_minutes * 60_000.0;
        let max_interval = if millis.is_finite() && millis > 0.0 {
            Duration::from_millis(millis.round() as u64)
        } else {
            Duration::ZERO
        };
        WatchConfig {
            ticker_interval: Duration::from_secs(self.ticker_interval_secs),
            max_interval,
            max_look_behind: Duration::from_secs(self.max_look_behind_secs),
            channel_capacity: self.channel_capacity,
            filter_field: self.filter_field.clone(),
            indent_output,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_API_TIMEOUT_SECS
}

fn default_ticker_interval_secs() -> u64 {
    DEFAULT_TICKER_INTERVAL.as_secs()
}

#[allow(clippy::cast_precision_loss)]
fn default_max_interval_minutes() -> f64 {
    (MAX_MAX_INTERVAL.as_secs() / 60) as f64
}

fn default_max_look_behind_secs() -> u64 {
    QUOTA_MAX_LOOK_BEHIND.as_secs()
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

fn default_filter_field() -> String {
    DEFAULT_FILTER_FIELD.to_string()
}
