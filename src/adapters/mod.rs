//! External collaborator adapters
//!
//! The engine talks to its collaborators through the traits in
//! [`traits`]; the submodules provide reference implementations:
//!
//! - [`memory`] - process-local stores used by the CLI and tests
//! - [`audit_file`] - append-only JSONL audit sink

pub mod audit_file;
pub mod memory;
pub mod traits;

pub use audit_file::JsonlAuditSink;
pub use traits::{AuditSink, NotificationSink, PatientDirectory, ReportStore, TemplateStore};
