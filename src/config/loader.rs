//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::AssayConfig;
use crate::domain::errors::AssayError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`AssayConfig`]
/// 4. Applies environment variable overrides (`ASSAY_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use assay::config::load_config;
///
/// let config = load_config("assay.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<AssayConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(AssayError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        AssayError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: AssayConfig = toml::from_str(&contents)
        .map_err(|e| AssayError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config
        .validate()
        .map_err(|e| AssayError::Configuration(format!("Configuration validation failed: {e}")))?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid substitution pattern");
    let mut missing_vars = Vec::new();

    let result = re
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            match std::env::var(name) {
                Ok(value) => value,
                Err(_) => {
                    missing_vars.push(name.to_string());
                    String::new()
                }
            }
        })
        .into_owned();

    if !missing_vars.is_empty() {
        return Err(AssayError::Configuration(format!(
            "Missing environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies `ASSAY_*` environment variable overrides
fn apply_env_overrides(config: &mut AssayConfig) {
    if let Ok(value) = std::env::var("ASSAY_APPLICATION_LOG_LEVEL") {
        config.application.log_level = value;
    }
    if let Ok(value) = std::env::var("ASSAY_AUDIT_LOG_PATH") {
        config.audit.log_path = value;
    }
    if let Ok(value) = std::env::var("ASSAY_AUDIT_ENABLED") {
        if let Ok(parsed) = value.parse::<bool>() {
            config.audit.enabled = parsed;
        }
    }
    if let Ok(value) = std::env::var("ASSAY_NOTIFICATIONS_ENABLED") {
        if let Ok(parsed) = value.parse::<bool>() {
            config.notifications.enabled = parsed;
        }
    }
    if let Ok(value) = std::env::var("ASSAY_LOGGING_LOCAL_ENABLED") {
        if let Ok(parsed) = value.parse::<bool>() {
            config.logging.local_enabled = parsed;
        }
    }
}
