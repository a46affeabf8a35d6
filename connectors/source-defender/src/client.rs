//! HTTP client for the alerts API.

use alerttail_engine::AlertSource;
use alerttail_types::{Alert, SourceError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::Serialize;

use crate::auth::TokenProvider;
use crate::config::{ClientSettings, USER_AGENT};
use crate::params::FetchQuery;
use crate::response::decode_alerts;

/// Lists alerts from the Defender alerts API.
pub struct DefenderClient {
    http: reqwest::Client,
    alerts_url: String,
    tokens: TokenProvider,
}

impl DefenderClient {
    /// Build a client with the configured timeout and default headers.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Transport`] if the HTTP client cannot be
    /// initialised (for example, no TLS backend is available).
    pub fn new(settings: &ClientSettings) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| SourceError::Transport(format!("HTTP client init failed: {e}")))?;

        Ok(Self {
            tokens: TokenProvider::new(http.clone(), settings),
            alerts_url: settings.alerts_url(),
            http,
        })
    }

    /// Fetch every alert matching the OData `filter`.
    ///
    /// A 401 drops the cached token, so the next call authenticates again.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] on token, transport, status, or decoding
    /// failure.
    pub async fn list_alerts(&self, filter: &str) -> Result<Vec<Alert>, SourceError> {
        self.get_alerts(&[("$filter", filter)]).await
    }

    /// Fetch alerts selected by the API's own query parameters.
    ///
    /// # Errors
    ///
    /// Same as [`DefenderClient::list_alerts`].
    pub async fn fetch_alerts(&self, query: &FetchQuery) -> Result<Vec<Alert>, SourceError> {
        self.get_alerts(query.pairs()).await
    }

    async fn get_alerts<Q>(&self, query: &Q) -> Result<Vec<Alert>, SourceError>
    where
        Q: Serialize + ?Sized,
    {
        let token = self.tokens.token().await?;
        let response = self
            .http
            .get(&self.alerts_url)
            .query(query)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| SourceError::Transport(format!("response read failed: {e}")))?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.tokens.invalidate().await;
        }

        let alerts = decode_alerts(status.as_u16(), &body)?;
        tracing::debug!(status = status.as_u16(), count = alerts.len(), "Alerts listed");
        Ok(alerts)
    }
}

#[async_trait]
impl AlertSource for DefenderClient {
    async fn list(&self, filter: &str) -> Result<Vec<Alert>, SourceError> {
        self.list_alerts(filter).await
    }
}
