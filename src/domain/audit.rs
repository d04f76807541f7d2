//! Audit log entry domain model
//!
//! Every state transition, result mutation, and critical-value detection
//! produces an immutable audit entry. Entries are append-only: they are never
//! updated or deleted. The transition record itself is mandatory (a failed
//! audit write fails the operation) while notification fan-out recorded
//! around it is best-effort.

use super::ids::{ActorId, ReportId, TemplateId};
use super::report::ReportStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// What an audit entry records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditAction {
    /// Report created from a template
    ReportCreated,
    /// Raw results merged into the report
    ResultsUpdated,
    /// Lifecycle status changed
    StatusChanged {
        from: ReportStatus,
        to: ReportStatus,
    },
    /// One or more critical values detected during a render
    CriticalValuesDetected { count: usize },
    /// A critical value was acknowledged
    CriticalValueAcknowledged { field_code: String },
    /// Report manually locked
    ReportLocked,
    /// Report manually unlocked; reason is mandatory
    ReportUnlocked,
    /// Post-sign-off amendment applied
    ReportAmended { amendment_number: u32 },
    /// System template cloned into a tenant copy
    TemplateCloned,
    /// New template version activated
    TemplateVersionActivated { version: u32 },
}

/// Immutable audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Unique entry identifier
    pub id: Uuid,

    /// Report the entry concerns, when applicable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_id: Option<ReportId>,

    /// Template the entry concerns, when applicable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<TemplateId>,

    /// What happened
    pub action: AuditAction,

    /// Who performed the operation
    pub performed_by: ActorId,

    /// Field values before the mutation, for mutating operations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_values: Option<BTreeMap<String, Value>>,

    /// Field values after the mutation, for mutating operations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_values: Option<BTreeMap<String, Value>>,

    /// Free-form detail (reasons, channels, checksums)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// When the entry was recorded
    pub timestamp: DateTime<Utc>,
}

impl AuditLogEntry {
    /// Creates an audit entry for a report-scoped action
    pub fn for_report(report_id: ReportId, action: AuditAction, performed_by: ActorId) -> Self {
        Self {
            id: Uuid::new_v4(),
            report_id: Some(report_id),
            template_id: None,
            action,
            performed_by,
            previous_values: None,
            new_values: None,
            details: None,
            timestamp: Utc::now(),
        }
    }

    /// Creates an audit entry for a template-scoped action
    pub fn for_template(
        template_id: TemplateId,
        action: AuditAction,
        performed_by: ActorId,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            report_id: None,
            template_id: Some(template_id),
            action,
            performed_by,
            previous_values: None,
            new_values: None,
            details: None,
            timestamp: Utc::now(),
        }
    }

    /// Attaches before/after value snapshots
    pub fn with_values(
        mut self,
        previous: BTreeMap<String, Value>,
        new: BTreeMap<String, Value>,
    ) -> Self {
        self.previous_values = Some(previous);
        self.new_values = Some(new);
        self
    }

    /// Attaches free-form detail
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}
