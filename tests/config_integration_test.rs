//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables should be run with
//! --test-threads=1 to avoid interference between tests.

use assay::config::load_config;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn cleanup_env_vars() {
    std::env::remove_var("ASSAY_APPLICATION_LOG_LEVEL");
    std::env::remove_var("ASSAY_AUDIT_LOG_PATH");
    std::env::remove_var("ASSAY_AUDIT_ENABLED");
    std::env::remove_var("ASSAY_NOTIFICATIONS_ENABLED");
    std::env::remove_var("ASSAY_LOGGING_LOCAL_ENABLED");
    std::env::remove_var("TEST_ASSAY_AUDIT_DIR");
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_complete_config() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let toml_content = r#"
[application]
name = "assay"
log_level = "debug"

[audit]
enabled = true
log_path = "logs/audit.jsonl"

[notifications]
enabled = false

[logging]
local_enabled = true
local_path = "logs"
local_rotation = "hourly"
"#;

    let file = write_config(toml_content);
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.name, "assay");
    assert_eq!(config.application.log_level, "debug");
    assert!(config.audit.enabled);
    assert_eq!(config.audit.log_path, "logs/audit.jsonl");
    assert!(!config.notifications.enabled);
    assert!(config.logging.local_enabled);
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_empty_config_uses_defaults() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config("");
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "info");
    assert!(config.audit.enabled);
    assert!(config.notifications.enabled);
    assert!(!config.logging.local_enabled);
}

#[test]
fn test_env_var_substitution() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_ASSAY_AUDIT_DIR", "custom-logs");

    let toml_content = r#"
[audit]
log_path = "${TEST_ASSAY_AUDIT_DIR}/audit.jsonl"
"#;

    let file = write_config(toml_content);
    let config = load_config(file.path()).unwrap();
    assert_eq!(config.audit.log_path, "custom-logs/audit.jsonl");

    cleanup_env_vars();
}

#[test]
fn test_missing_env_var_fails() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let toml_content = r#"
[audit]
log_path = "${ASSAY_TEST_UNSET_VARIABLE}/audit.jsonl"
"#;

    let file = write_config(toml_content);
    assert!(load_config(file.path()).is_err());
}

#[test]
fn test_env_overrides_take_precedence() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("ASSAY_APPLICATION_LOG_LEVEL", "warn");
    std::env::set_var("ASSAY_NOTIFICATIONS_ENABLED", "false");

    let toml_content = r#"
[application]
log_level = "info"

[notifications]
enabled = true
"#;

    let file = write_config(toml_content);
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "warn");
    assert!(!config.notifications.enabled);

    cleanup_env_vars();
}

#[test]
fn test_invalid_log_level_rejected() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let toml_content = r#"
[application]
log_level = "shout"
"#;

    let file = write_config(toml_content);
    assert!(load_config(file.path()).is_err());
}
