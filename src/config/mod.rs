//! Configuration management.
//!
//! This module provides TOML-based configuration loading, parsing, and
//! validation for the CLI and embedding services.
//!
//! # Overview
//!
//! Configuration files support:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - Default values for every optional setting
//! - `ASSAY_*` environment variable overrides
//! - Validation before use
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! name = "assay"
//! log_level = "info"
//!
//! [audit]
//! enabled = true
//! log_path = "logs/audit.jsonl"
//!
//! [notifications]
//! enabled = true
//!
//! [logging]
//! local_enabled = false
//! local_path = "logs"
//! local_rotation = "daily"
//! ```

pub mod loader;
pub mod schema;

pub use loader::load_config;
pub use schema::{
    ApplicationConfig, AssayConfig, AuditConfig, LoggingConfig, NotificationConfig,
};
