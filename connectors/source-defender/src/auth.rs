//! OAuth2 client-credentials token cache.

use std::time::Duration;

use alerttail_types::SourceError;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::ClientSettings;
use crate::response::{TokenError, TokenResponse};

/// Tokens are refreshed this long before they expire.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Fetches and caches bearer tokens for the alerts API.
///
/// Concurrent callers share one in-flight refresh through the cache lock.
pub(crate) struct TokenProvider {
    http: reqwest::Client,
    token_url: String,
    form: [(&'static str, String); 4],
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub(crate) fn new(http: reqwest::Client, settings: &ClientSettings) -> Self {
        Self {
            http,
            token_url: settings.token_url.clone(),
            form: [
                ("grant_type", "client_credentials".to_string()),
                ("client_id", settings.client_id.clone()),
                ("client_secret", settings.client_secret.clone()),
                ("resource", settings.resource.clone()),
            ],
            cached: Mutex::new(None),
        }
    }

    /// A valid access token, fetching a new one when the cached token is
    /// missing or due for refresh.
    pub(crate) async fn token(&self) -> Result<String, SourceError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let fresh = self.fetch().await?;
        let value = fresh.access_token.clone();
        let lifetime = Duration::from_secs(fresh.expires_in).saturating_sub(REFRESH_MARGIN);
        *cached = Some(CachedToken {
            value: fresh.access_token,
            refresh_at: Instant::now() + lifetime,
        });
        tracing::debug!(expires_in = fresh.expires_in, "Access token refreshed");
        Ok(value)
    }

    /// Drop the cached token so the next call fetches a new one.
    pub(crate) async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    async fn fetch(&self) -> Result<TokenResponse, SourceError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&self.form)
            .send()
            .await
            .map_err(|e| SourceError::Auth(format!("token request failed: {e}")))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| SourceError::Auth(format!("token response read failed: {e}")))?;

        if !status.is_success() {
            let err: TokenError = serde_json::from_slice(&body).unwrap_or_default();
            return Err(SourceError::Auth(format!(
                "token endpoint returned {status}: {} {}",
                err.error, err.error_description
            )));
        }

        let token: TokenResponse = serde_json::from_slice(&body)
            .map_err(|e| SourceError::Auth(format!("token response malformed: {e}")))?;
        if token.access_token.is_empty() {
            return Err(SourceError::Auth("token response has no access_token".into()));
        }
        Ok(token)
    }
}
