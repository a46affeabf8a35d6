//! Defender client settings, derived from the alerttail config file.

use std::fmt;
use std::time::Duration;

use alerttail_engine::config::AppConfig;

/// Sent with every request.
pub const USER_AGENT: &str = "alerttail";

/// Token endpoint for `tenant` on the Microsoft identity platform.
#[must_use]
pub fn default_token_url(tenant: &str) -> String {
    format!("https://login.microsoftonline.com/{tenant}/oauth2/token")
}

/// Everything the client needs to reach the API.
#[derive(Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub token_url: String,
    /// OAuth resource the access token is issued for.
    pub resource: String,
    /// Optional version segment between `/api` and `/alerts`.
    pub api_version: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    pub timeout: Duration,
}

impl ClientSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let base_url = config.api.base_url.trim_end_matches('/').to_string();
        Self {
            token_url: config
                .api
                .token_url
                .clone()
                .unwrap_or_else(|| default_token_url(&config.credentials.tenant_id)),
            resource: config
                .api
                .resource
                .clone()
                .unwrap_or_else(|| base_url.clone()),
            base_url,
            api_version: config
                .api
                .version
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
            client_id: config.credentials.client_id.clone(),
            client_secret: config.credentials.client_secret.clone(),
            timeout: Duration::from_secs(config.api.timeout_secs),
        }
    }

    /// The list-alerts endpoint.
    #[must_use]
    pub fn alerts_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        match &self.api_version {
            Some(version) => format!("{base}/api/{version}/alerts"),
            None => format!("{base}/api/alerts"),
        }
    }
}

impl fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSettings")
            .field("base_url", &self.base_url)
            .field("token_url", &self.token_url)
            .field("resource", &self.resource)
            .field("api_version", &self.api_version)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}
