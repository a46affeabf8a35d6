//! Semantic validation for parsed configuration values.

use anyhow::{bail, Result};

use crate::config::types::{ApiConfig, AppConfig, Credentials};

/// Validate an optional endpoint URL field.
fn validate_url(value: &str, context: &str, errors: &mut Vec<String>) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(format!("{context} must not be empty"));
    } else if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
        errors.push(format!(
            "{context} '{value}' must start with http:// or https://"
        ));
    }
}

fn validate_credentials(creds: &Credentials, errors: &mut Vec<String>) {
    if creds.tenant_id.trim().is_empty() {
        errors.push("credentials.tenant_id must not be empty".to_string());
    }
    if creds.client_id.trim().is_empty() {
        errors.push("credentials.client_id must not be empty".to_string());
    }
    if creds.client_secret.is_empty() {
        errors.push("credentials.client_secret must not be empty".to_string());
    }
}

fn validate_api(api: &ApiConfig, errors: &mut Vec<String>) {
    validate_url(&api.base_url, "api.base_url", errors);
    if let Some(ref token_url) = api.token_url {
        validate_url(token_url, "api.token_url", errors);
    }
    if let Some(ref resource) = api.resource {
        if resource.trim().is_empty() {
            errors.push("api.resource must not be empty when set".to_string());
        }
    }
    if let Some(ref version) = api.version {
        let version = version.trim();
        if version.is_empty() || version.contains('/') {
            errors.push(format!(
                "api.version must be a single path segment such as v1.0, got '{version}'"
            ));
        }
    }
    if api.timeout_secs == 0 {
        errors.push("api.timeout_secs must be > 0".to_string());
    }
}

/// Validate a parsed configuration file.
/// Returns `Ok(())` if valid, Err with all validation errors if not.
///
/// # Errors
///
/// Returns an error listing all validation failures found in the config.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let mut errors = Vec::new();

    validate_credentials(&config.credentials, &mut errors);
    validate_api(&config.api, &mut errors);
    errors.extend(
        config
            .watch
            .to_watch_config(false)
            .problems()
            .into_iter()
            .map(|p| format!("watch: {p}")),
    );

    if errors.is_empty() {
        Ok(())
    } else {
        bail!("Config validation failed:\n  - {}", errors.join("\n  - "));
    }
}
