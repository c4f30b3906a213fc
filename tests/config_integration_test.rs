//! Integration tests for configuration loading and validation
//!
//! Tests that touch environment variables hold ENV_MUTEX so they do not
//! interfere with each other.

use epiexport::config::load_config;
use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn cleanup_env_vars() {
    for name in [
        "EPIEXPORT_APPLICATION_LOG_LEVEL",
        "EPIEXPORT_BACKEND_ENDPOINT",
        "EPIEXPORT_BACKEND_API_TOKEN",
        "EPIEXPORT_EXPORT_PAGE_SIZE",
        "EPIEXPORT_EXPORT_MAX_RATE_LIMIT_RETRIES",
        "EPIEXPORT_EXPORT_STOP_ON_EMPTY_PAGE",
        "TEST_EPIEXPORT_TOKEN",
    ] {
        std::env::remove_var(name);
    }
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
[application]
log_level = "debug"

[backend]
endpoint = "https://dashboard.example.org/api/"
url_prefix = "server://"
timeout_seconds = 90
tls_verify = false
api_token = "plain-token"

[export]
page_size = 2500
throttle_base_ms = 250
backoff_base_ms = 2000
max_rate_limit_retries = 12
stop_on_empty_page = false
output_dir = "/tmp/exports"

[logging]
local_enabled = true
local_path = "/tmp/epiexport-logs"
local_rotation = "hourly"
json_console = true
"#,
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.backend.endpoint, "https://dashboard.example.org/api/");
    assert_eq!(config.backend.timeout_seconds, 90);
    assert!(!config.backend.tls_verify);
    let token = config.backend.api_token.as_ref().unwrap();
    let token: &str = token.expose_secret().as_ref();
    assert_eq!(token, "plain-token");

    assert_eq!(config.export.page_size, 2500);
    assert_eq!(config.export.throttle_base_ms, 250);
    assert_eq!(config.export.backoff_base_ms, 2000);
    assert_eq!(config.export.max_rate_limit_retries, Some(12));
    assert!(!config.export.stop_on_empty_page);
    assert_eq!(config.export.output_dir, "/tmp/exports");

    assert!(config.logging.local_enabled);
    assert_eq!(config.logging.local_rotation, "hourly");
    assert!(config.logging.json_console);
}

#[test]
fn test_minimal_config_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
[backend]
endpoint = "https://dashboard.example.org/"
"#,
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "info");
    assert_eq!(config.backend.url_prefix, "server://");
    assert!(config.backend.tls_verify);
    assert!(config.backend.api_token.is_none());
    assert_eq!(config.export.page_size, 3000);
    assert_eq!(config.export.throttle_base_ms, 500);
    assert_eq!(config.export.backoff_base_ms, 1000);
    assert_eq!(config.export.max_rate_limit_retries, None);
    assert!(config.export.stop_on_empty_page);
    assert!(!config.logging.local_enabled);
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("TEST_EPIEXPORT_TOKEN", "from-environment");

    let file = write_config(
        r#"
[backend]
endpoint = "https://dashboard.example.org/"
api_token = "${TEST_EPIEXPORT_TOKEN}"
"#,
    );

    let config = load_config(file.path()).unwrap();
    let token = config.backend.api_token.as_ref().unwrap();
    let token: &str = token.expose_secret().as_ref();
    assert_eq!(token, "from-environment");

    cleanup_env_vars();
}

#[test]
fn test_missing_substitution_variable_fails() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
[backend]
endpoint = "https://dashboard.example.org/"
api_token = "${TEST_EPIEXPORT_TOKEN}"
"#,
    );

    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("TEST_EPIEXPORT_TOKEN"));
}

#[test]
fn test_env_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("EPIEXPORT_APPLICATION_LOG_LEVEL", "trace");
    std::env::set_var("EPIEXPORT_BACKEND_ENDPOINT", "http://localhost:9000/");
    std::env::set_var("EPIEXPORT_BACKEND_API_TOKEN", "override-token");
    std::env::set_var("EPIEXPORT_EXPORT_PAGE_SIZE", "500");
    std::env::set_var("EPIEXPORT_EXPORT_MAX_RATE_LIMIT_RETRIES", "3");
    std::env::set_var("EPIEXPORT_EXPORT_STOP_ON_EMPTY_PAGE", "false");

    let file = write_config(
        r#"
[application]
log_level = "info"

[backend]
endpoint = "https://dashboard.example.org/"

[export]
page_size = 3000
"#,
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "trace");
    assert_eq!(config.backend.endpoint, "http://localhost:9000/");
    assert!(config.backend.api_token.is_some());
    assert_eq!(config.export.page_size, 500);
    assert_eq!(config.export.max_rate_limit_retries, Some(3));
    assert!(!config.export.stop_on_empty_page);

    cleanup_env_vars();
}

#[test]
fn test_invalid_override_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("EPIEXPORT_EXPORT_PAGE_SIZE", "a lot");

    let file = write_config(
        r#"
[backend]
endpoint = "https://dashboard.example.org/"
"#,
    );

    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("EPIEXPORT_EXPORT_PAGE_SIZE"));

    cleanup_env_vars();
}

#[test]
fn test_validation_errors() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let cases = [
        (
            "[backend]\nendpoint = \"ftp://dashboard.example.org/\"\n",
            "backend.endpoint",
        ),
        (
            "[backend]\nendpoint = \"https://dashboard.example.org/\"\n[export]\npage_size = 0\n",
            "page_size",
        ),
        (
            "[backend]\nendpoint = \"https://dashboard.example.org/\"\n[export]\npage_size = 60000\n",
            "page_size",
        ),
        (
            "[backend]\nendpoint = \"https://dashboard.example.org/\"\n[logging]\nlocal_rotation = \"weekly\"\n",
            "local_rotation",
        ),
        (
            "[application]\nlog_level = \"verbose\"\n[backend]\nendpoint = \"https://dashboard.example.org/\"\n",
            "log_level",
        ),
    ];

    for (contents, expected) in cases {
        let file = write_config(contents);
        let err = load_config(file.path()).unwrap_err();
        assert!(
            err.to_string().contains(expected),
            "expected '{expected}' in: {err}"
        );
    }
}

#[test]
fn test_malformed_toml() {
    let file = write_config("[backend\nendpoint = ");
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse TOML"));
}
