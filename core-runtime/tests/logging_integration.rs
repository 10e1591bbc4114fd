//! Integration tests for logging system

use bridge_traits::time::LogLevel;
use core_runtime::logging::{
    init_logging, redact_if_sensitive, strip_path, LogFormat, LoggingConfig, MOCK_AUDIT_TARGET,
};
use core_runtime::Error;

#[test]
fn test_logging_initializes_once_per_process() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn);

    init_logging(config.clone()).unwrap();
    tracing::warn!(target: MOCK_AUDIT_TARGET, file_id = "abc", "mock substitution");

    // A global subscriber is already installed
    match init_logging(config) {
        Err(Error::Config(msg)) => assert!(msg.contains("Failed to initialize logging")),
        other => panic!("expected second init to fail, got {:?}", other),
    }
}

#[test]
fn test_invalid_filter_is_config_error() {
    let config = LoggingConfig::default().with_filter("core_auth=[");

    assert!(matches!(init_logging(config), Err(Error::Config(_))));
}

#[test]
fn test_credential_fields_redacted() {
    for field in ["access_token", "refresh_token", "client_secret", "private_key"] {
        assert_eq!(redact_if_sensitive(field, "value"), "[REDACTED]");
    }
}

#[test]
fn test_service_account_email_redacted() {
    let redacted = redact_if_sensitive("client_email", "docs@school-project.iam.gserviceaccount.com");

    assert!(redacted.starts_with('d'));
    assert!(!redacted.contains("school-project"));
}

#[test]
fn test_identifiers_pass_through() {
    assert_eq!(redact_if_sensitive("file_id", "1x2y3z"), "1x2y3z");
    assert_eq!(redact_if_sensitive("mime_type", "application/pdf"), "application/pdf");
}

#[test]
fn test_key_file_paths_stripped() {
    assert_eq!(strip_path("/opt/backend/credentials/service.json"), "service.json");
    assert_eq!(strip_path("D:\\backend\\oauth_client.json"), "oauth_client.json");
    assert_eq!(strip_path(""), "");
}
