//! Domain models and types for the report engine.
//!
//! This module contains the core domain models, types, and business rules.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`ReportId`], [`TemplateId`],
//!   [`TemplateCode`], [`PatientId`], [`ActorId`])
//! - **Domain models** ([`Template`], [`Report`], [`PatientContext`],
//!   [`AuditLogEntry`])
//! - **Error types** ([`AssayError`], [`FieldError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Identifiers use the newtype pattern to prevent mixing different ID types:
//!
//! ```rust
//! use assay::domain::{PatientId, TemplateCode};
//!
//! # fn example() -> std::result::Result<(), String> {
//! let patient_id = PatientId::new("PT-0042")?;
//! let code = TemplateCode::new("CBC")?;
//!
//! // This won't compile - type safety prevents mixing IDs
//! // let wrong: PatientId = code;  // Compile error!
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, AssayError>`]. Validation
//! failures carry a structured field-level list so callers can highlight
//! exact fields rather than parse a message string.

pub mod audit;
pub mod errors;
pub mod ids;
pub mod patient;
pub mod report;
pub mod result;
pub mod template;

// Re-export commonly used types for convenience
pub use audit::{AuditAction, AuditLogEntry};
pub use errors::{AssayError, FieldError, FieldErrorKind};
pub use ids::{ActorId, OrderId, PatientId, ReportId, TemplateCode, TemplateId, TenantId};
pub use patient::{Gender, PatientContext};
pub use report::{Amendment, CriticalValue, Delivery, Report, ReportStatus, SignOff};
pub use result::Result;
pub use template::{
    AgeBandRange, CalculatedField, Field, FieldType, InterpretationRule, PregnancyRange,
    RangeSpec, ReferenceRange, RepeatableSection, ReportCategory, Section, SensitivityPanel,
    Template, TemplateBuilder, TemplateType, TrimesterRange,
};
