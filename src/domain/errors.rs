//! Domain error types
//!
//! This module defines the error hierarchy for the report engine. All errors
//! are domain-specific and don't expose third-party types. Validation errors
//! carry a structured field-level list, never a single flattened string, so
//! callers can highlight exact fields.

use super::report::ReportStatus;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for the report engine
///
/// This is the primary error type used throughout the crate. Variants map
/// directly onto the failure modes of rendering and workflow operations.
#[derive(Debug, Error)]
pub enum AssayError {
    /// Template could not be resolved for the requesting tenant
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// Report could not be found
    #[error("Report not found: {0}")]
    ReportNotFound(String),

    /// Patient could not be found in the patient registry
    #[error("Patient not found: {0}")]
    PatientNotFound(String),

    /// Structured field-level validation failure
    #[error("Validation failed: {}", format_field_errors(.0))]
    Validation(Vec<FieldError>),

    /// Requested workflow move is not in the transition table
    #[error("Invalid transition: report is {current}, cannot move to {requested}")]
    InvalidTransition {
        /// Status the report currently holds
        current: ReportStatus,
        /// Status the caller attempted to move to
        requested: ReportStatus,
    },

    /// Report is locked and direct edits are disallowed
    #[error("Report {0} is locked; use the amendment path")]
    ReportLocked(String),

    /// Optimistic concurrency check failed; the report changed underneath
    #[error("Concurrent modification of report {0}; reload and retry")]
    Conflict(String),

    /// A formula or rule condition could not be evaluated
    ///
    /// Recovered locally during rendering: the calculated field is set to
    /// null or the rule skipped. Surfaced as an error only when a formula is
    /// evaluated in isolation.
    #[error("Formula evaluation failed: {0}")]
    FormulaEvaluation(String),

    /// Critical-value notification could not be delivered
    ///
    /// Never rolls back the underlying transition; logged and carried on.
    #[error("Notification delivery failed: {0}")]
    NotificationDelivery(String),

    /// The mandatory audit record for a transition could not be written
    ///
    /// Fatal: the transition fails rather than proceed unaudited.
    #[error("Audit write failed: {0}")]
    AuditWrite(String),

    /// Attempt to mutate a read-only system template
    #[error("System template {0} is read-only; clone it into a tenant copy")]
    SystemTemplateReadOnly(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl AssayError {
    /// Shorthand for a single-field validation error
    pub fn validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        AssayError::Validation(vec![FieldError::new(code, FieldErrorKind::Invalid, message)])
    }

    /// Shorthand for a missing mandatory reason
    ///
    /// Amendment, unlock, and rejection operations all require an explicit
    /// non-empty reason.
    pub fn missing_reason(operation: &str) -> Self {
        AssayError::Validation(vec![FieldError::new(
            "reason",
            FieldErrorKind::Required,
            format!("{operation} requires a non-empty reason"),
        )])
    }
}

/// Category of a field-level validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    /// Required field is missing or empty
    Required,
    /// Value could not be parsed as the declared field type
    Type,
    /// Numeric value is outside the declared validation bounds
    OutOfBounds,
    /// Value is not in the declared option set
    InvalidOption,
    /// Catch-all for other per-field failures
    Invalid,
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldErrorKind::Required => "required",
            FieldErrorKind::Type => "type",
            FieldErrorKind::OutOfBounds => "out_of_bounds",
            FieldErrorKind::InvalidOption => "invalid_option",
            FieldErrorKind::Invalid => "invalid",
        };
        write!(f, "{s}")
    }
}

/// A single field-level validation failure
///
/// Returned in lists so a UI can highlight exact fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field code the error applies to
    pub field_code: String,

    /// Failure category
    pub kind: FieldErrorKind,

    /// Human-readable message
    pub message: String,
}

impl FieldError {
    /// Creates a new field error
    pub fn new(
        field_code: impl Into<String>,
        kind: FieldErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field_code: field_code.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.field_code, self.kind, self.message)
    }
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(FieldError::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// Conversion from std::io::Error
impl From<std::io::Error> for AssayError {
    fn from(err: std::io::Error) -> Self {
        AssayError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for AssayError {
    fn from(err: serde_json::Error) -> Self {
        AssayError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for AssayError {
    fn from(err: toml::de::Error) -> Self {
        AssayError::Configuration(format!("TOML parse error: {err}"))
    }
}
