//! Integration tests for config parsing and validation using fixture files.

use std::path::PathBuf;
use std::time::Duration;

use alerttail_engine::config::{parser, validator};

fn fixture(name: &str) -> PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests/fixtures/config")
        .join(name)
}

/// Test parsing and validating a well-formed config fixture.
#[test]
fn test_parse_and_validate_fixture_config() {
    std::env::set_var("TEST_AT_TENANT_ID", "contoso.onmicrosoft.com");
    std::env::set_var("TEST_AT_CLIENT_ID", "alerttail-reader");
    std::env::set_var("TEST_AT_CLIENT_SECRET", "fixture-secret");

    let config = parser::parse_config(&fixture("valid.yaml")).expect("Failed to parse fixture");

    assert_eq!(config.credentials.tenant_id, "contoso.onmicrosoft.com");
    assert_eq!(config.credentials.client_secret, "fixture-secret");
    assert_eq!(config.api.timeout_secs, 20);
    assert!(config.api.token_url.is_none());

    let watch = config.watch.to_watch_config(false);
    assert_eq!(watch.ticker_interval, Duration::from_secs(10));
    assert_eq!(watch.max_interval, Duration::from_secs(30 * 60));
    assert_eq!(watch.max_look_behind, Duration::from_secs(7 * 86_400));
    assert_eq!(watch.channel_capacity, 256);
    assert_eq!(watch.filter_field, "lastUpdateTime");

    validator::validate_config(&config).expect("Validation should pass");

    std::env::remove_var("TEST_AT_TENANT_ID");
    std::env::remove_var("TEST_AT_CLIENT_ID");
    std::env::remove_var("TEST_AT_CLIENT_SECRET");
}

/// Test that an invalid config fixture parses but fails validation with
/// every problem listed.
#[test]
fn test_parse_and_validate_invalid_fixture() {
    let config = parser::parse_config(&fixture("invalid.yaml")).expect("fixture should parse");

    let err = validator::validate_config(&config).unwrap_err().to_string();
    assert!(err.contains("credentials.tenant_id"), "got: {err}");
    assert!(err.contains("api.base_url"), "got: {err}");
    assert!(err.contains("ticker interval"), "got: {err}");
    assert!(err.contains("max interval"), "got: {err}");
    assert!(err.contains("channel capacity"), "got: {err}");
}

/// A fixture referencing unset variables fails with their names.
#[test]
fn test_missing_env_vars_in_fixture() {
    std::env::remove_var("TEST_AT_MISSING_ONLY");
    let yaml = "credentials:\n  tenant_id: ${TEST_AT_MISSING_ONLY}\n  client_id: c\n  client_secret: s\n";
    let err = parser::parse_config_str(yaml).unwrap_err().to_string();
    assert!(err.contains("TEST_AT_MISSING_ONLY"));
}
