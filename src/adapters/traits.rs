//! Collaborator abstraction traits
//!
//! This module defines the interfaces the report engine expects from its
//! collaborators: template storage, report persistence, the patient
//! registry, the notification sink, and the audit sink. Persistence
//! technology, delivery mechanics, and tenant isolation live behind these
//! traits; the engine only sees the contracts.

use crate::domain::audit::AuditLogEntry;
use crate::domain::ids::{PatientId, ReportId, TemplateCode, TemplateId, TenantId};
use crate::domain::patient::PatientContext;
use crate::domain::report::{CriticalValue, Report};
use crate::domain::template::Template;
use crate::domain::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Template storage trait
///
/// Templates are immutable once activated: `save` upserts whole template
/// versions, never patches them in place. Tenant/system fallback resolution
/// is owned by the engine; the store answers exact-scope queries.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Find a template version by its unique id
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails for reasons other than
    /// "not found".
    async fn find_by_id(&self, id: &TemplateId) -> Result<Option<Template>>;

    /// Find the active template with the given code in an exact tenant scope
    ///
    /// `tenant = None` queries system templates only.
    async fn find_active_by_code(
        &self,
        code: &TemplateCode,
        tenant: Option<&TenantId>,
    ) -> Result<Option<Template>>;

    /// Insert or replace a template version keyed by id
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails, or if inserting would leave two
    /// active templates sharing a code within one tenant scope.
    async fn save(&self, template: &Template) -> Result<()>;
}

/// Report persistence trait
///
/// Concurrent operations on the same report must serialize: `update` carries
/// the revision the caller loaded, and the store rejects the write with a
/// conflict when the stored revision differs. Operations on different
/// reports are independent.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Insert a newly created report
    async fn insert(&self, report: &Report) -> Result<()>;

    /// Load a report by id
    async fn load(&self, id: &ReportId) -> Result<Option<Report>>;

    /// Persist a mutated report
    ///
    /// # Arguments
    ///
    /// * `report` - The mutated report, revision already bumped
    /// * `expected_revision` - The revision the caller loaded
    ///
    /// # Errors
    ///
    /// Returns `Conflict` when the stored revision no longer matches
    /// `expected_revision`.
    async fn update(&self, report: &Report, expected_revision: u64) -> Result<()>;

    /// Next sequence number for report numbering, scoped per category
    /// prefix and calendar day; starts at 1 and increments atomically
    async fn next_sequence(&self, category_prefix: &str, date: NaiveDate) -> Result<u32>;
}

/// Patient registry trait
#[async_trait]
pub trait PatientDirectory: Send + Sync {
    /// Demographic context for a patient
    async fn patient_context(&self, id: &PatientId) -> Result<Option<PatientContext>>;

    /// Contact to notify for critical values on this patient's reports
    /// (typically the ordering clinician)
    async fn critical_contact(&self, id: &PatientId) -> Result<Option<String>>;
}

/// Critical-value notification sink
///
/// Delivery is fire-and-forget from the engine's perspective: a failed
/// notification is logged and never rolls back the underlying transition.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Attempt to deliver a critical-value alert
    async fn notify_critical(
        &self,
        recipient: &str,
        report_number: &str,
        critical_values: &[CriticalValue],
    ) -> Result<()>;
}

/// Append-only audit sink
///
/// The transition record is mandatory: when `append` fails, the operation
/// that produced the entry must fail rather than proceed unaudited.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append an audit entry
    async fn append(&self, entry: &AuditLogEntry) -> Result<()>;
}
