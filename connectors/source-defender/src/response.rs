//! Response bodies of the alerts and token endpoints.

use alerttail_types::{Alert, ApiErrorBody, SourceError};
use serde::{Deserialize, Deserializer};

/// `GET /api/alerts` success body. The `@odata.context` member is ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct AlertsPage {
    #[serde(default)]
    pub value: Vec<Alert>,
}

/// Non-2xx body of the alerts API.
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

/// Token endpoint success body.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    /// Seconds until expiry. The v1 endpoint sends it as a string.
    #[serde(deserialize_with = "seconds_from_number_or_string", default)]
    pub expires_in: u64,
}

/// Token endpoint error body.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct TokenError {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub error_description: String,
}

fn seconds_from_number_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Number(u64),
        Text(String),
    }

    match Seconds::deserialize(deserializer)? {
        Seconds::Number(n) => Ok(n),
        Seconds::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Decode an alerts response given its status and raw body.
pub(crate) fn decode_alerts(status: u16, body: &[u8]) -> Result<Vec<Alert>, SourceError> {
    if !(200..300).contains(&status) {
        return Err(SourceError::Api {
            status,
            body: decode_api_error(status, body),
        });
    }
    serde_json::from_slice::<AlertsPage>(body)
        .map(|page| page.value)
        .map_err(|e| SourceError::Decode(format!("alerts response: {e}")))
}

/// Structured error body, or a synthetic one when the body is not the
/// documented shape.
fn decode_api_error(status: u16, body: &[u8]) -> ApiErrorBody {
    serde_json::from_slice::<ApiErrorEnvelope>(body).map_or_else(
        |_| ApiErrorBody {
            code: format!("Http{status}"),
            message: String::from_utf8_lossy(body).chars().take(512).collect(),
            target: String::new(),
        },
        |envelope| envelope.error,
    )
}
