//! Report domain model
//!
//! A report is the mutable instance created when a result-entry workflow
//! starts against a template snapshot. It carries the raw result values, the
//! derived rendering outputs, the lifecycle status, the lock flag, and the
//! append-only amendment log. Reports are never hard-deleted; cancellation
//! is a terminal status.

use super::ids::{ActorId, OrderId, PatientId, ReportId, TemplateId, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle status of a report
///
/// Legal moves between statuses are owned by the workflow transition table
/// (`core::workflow::transitions`); nothing else may change a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    /// Created, results being seeded
    Draft,
    /// Awaiting technician result entry
    PendingEntry,
    /// Awaiting quality control
    PendingQc,
    /// Awaiting specialist review
    PendingReview,
    /// Signed off and locked
    Approved,
    /// Released to the recipient
    Delivered,
    /// Corrected after sign-off via the amendment path
    Amended,
    /// Terminal; the report was abandoned before sign-off
    Cancelled,
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReportStatus::Draft => "DRAFT",
            ReportStatus::PendingEntry => "PENDING_ENTRY",
            ReportStatus::PendingQc => "PENDING_QC",
            ReportStatus::PendingReview => "PENDING_REVIEW",
            ReportStatus::Approved => "APPROVED",
            ReportStatus::Delivered => "DELIVERED",
            ReportStatus::Amended => "AMENDED",
            ReportStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{s}")
    }
}

/// A detected critical value requiring urgent clinician notification
///
/// Acknowledgement is an explicit, separate operation: it stamps who and
/// when without altering report status. Acknowledgement and clinical
/// sign-off are independent concerns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalValue {
    /// Field code that produced the critical value
    pub field_code: String,

    /// Display label of the field
    pub field_label: String,

    /// The offending value, verbatim
    pub value: Value,

    /// Why the value is critical (threshold crossed, phrase matched, ...)
    pub reason: String,

    /// Who acknowledged the critical value, once acknowledged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged_by: Option<ActorId>,

    /// When the critical value was acknowledged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime<Utc>>,
}

impl CriticalValue {
    /// Creates an unacknowledged critical value entry
    pub fn new(
        field_code: impl Into<String>,
        field_label: impl Into<String>,
        value: Value,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            field_code: field_code.into(),
            field_label: field_label.into(),
            value,
            reason: reason.into(),
            acknowledged_by: None,
            acknowledged_at: None,
        }
    }

    /// Whether this entry has been acknowledged
    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged_by.is_some()
    }
}

/// A post-sign-off correction
///
/// Amendments are additive: the pre-amendment values are captured in
/// `previous_values` and are never overwritten by later amendments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amendment {
    /// Monotonically increasing, starting at 1
    pub amendment_number: u32,

    /// When the amendment was applied
    pub amended_at: DateTime<Utc>,

    /// Who applied the amendment
    pub amended_by: ActorId,

    /// Mandatory reason
    pub reason: String,

    /// Values of the changed fields before the amendment
    pub previous_values: BTreeMap<String, Value>,

    /// Values of the changed fields after the amendment
    pub new_values: BTreeMap<String, Value>,

    /// Codes of the fields the amendment touched
    pub fields_changed: Vec<String>,
}

/// Sign-off stamp recorded on approval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignOff {
    /// Reviewer who approved the report
    pub approved_by: ActorId,

    /// When the report was approved
    pub approved_at: DateTime<Utc>,

    /// Optional signature metadata (e.g. a signature image reference)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// Delivery stamp recorded when the report is released
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    /// Channel the report went out on (portal, email, print, ...)
    pub channel: String,

    /// When the report was delivered
    pub delivered_at: DateTime<Utc>,
}

/// The mutable report instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Unique identifier
    pub id: ReportId,

    /// Human-readable sequential number, scoped per category and day
    pub report_number: String,

    /// Template this report was created from
    pub template_id: TemplateId,

    /// Template version captured at creation; later template versions never
    /// retroactively change an existing report
    pub template_version: u32,

    /// Subject patient
    pub patient_id: PatientId,

    /// Originating order
    pub order_id: OrderId,

    /// Tenant scope the report belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<TenantId>,

    /// Raw result values, field code -> scalar/array value
    pub results: BTreeMap<String, Value>,

    /// Derived calculated values from the last render
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub calculated_values: BTreeMap<String, Value>,

    /// Derived interpretation statements from the last render
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interpretations: Vec<String>,

    /// Derived critical values from the last render, with acknowledgement
    /// stamps preserved across re-renders
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub critical_values: Vec<CriticalValue>,

    /// Current lifecycle status
    pub status: ReportStatus,

    /// When true, `results` may only change via the amendment path
    pub is_locked: bool,

    /// Append-only amendment log
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub amendments: Vec<Amendment>,

    /// Sign-off stamp, set on approval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_off: Option<SignOff>,

    /// Delivery stamp, set when released
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<Delivery>,

    /// Reason recorded by the most recent QC or review rejection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,

    /// Optimistic concurrency counter; bumped on every persisted mutation
    pub revision: u64,

    /// When the report was created
    pub created_at: DateTime<Utc>,

    /// When the report was last mutated
    pub updated_at: DateTime<Utc>,
}

impl Report {
    /// Number of amendments applied so far
    pub fn amendment_count(&self) -> u32 {
        self.amendments.len() as u32
    }

    /// Whether results may be edited directly
    ///
    /// Locked reports and reports at or past sign-off require the amendment
    /// path instead.
    pub fn is_editable(&self) -> bool {
        !self.is_locked
            && !matches!(
                self.status,
                ReportStatus::Approved
                    | ReportStatus::Delivered
                    | ReportStatus::Amended
                    | ReportStatus::Cancelled
            )
    }

    /// Turnaround time from creation to sign-off, when signed off
    pub fn turnaround(&self) -> Option<chrono::Duration> {
        self.sign_off
            .as_ref()
            .map(|s| s.approved_at - self.created_at)
    }

    /// Finds an unacknowledged critical value entry by field code
    pub fn unacknowledged_critical(&mut self, field_code: &str) -> Option<&mut CriticalValue> {
        self.critical_values
            .iter_mut()
            .find(|cv| cv.field_code == field_code && !cv.is_acknowledged())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_report(status: ReportStatus, locked: bool) -> Report {
        Report {
            id: ReportId::generate(),
            report_number: "HEM2608070001".to_string(),
            template_id: TemplateId::generate(),
            template_version: 1,
            patient_id: PatientId::new("PT-1").unwrap(),
            order_id: OrderId::new("ORD-1").unwrap(),
            tenant: None,
            results: BTreeMap::new(),
            calculated_values: BTreeMap::new(),
            interpretations: Vec::new(),
            critical_values: Vec::new(),
            status,
            is_locked: locked,
            amendments: Vec::new(),
            sign_off: None,
            delivery: None,
            rejection_reason: None,
            revision: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_display_uses_wire_names() {
        assert_eq!(ReportStatus::PendingEntry.to_string(), "PENDING_ENTRY");
        assert_eq!(ReportStatus::PendingQc.to_string(), "PENDING_QC");
        assert_eq!(ReportStatus::Cancelled.to_string(), "CANCELLED");
    }

    #[test]
    fn test_status_serialization_matches_display() {
        for status in [
            ReportStatus::Draft,
            ReportStatus::PendingEntry,
            ReportStatus::PendingQc,
            ReportStatus::PendingReview,
            ReportStatus::Approved,
            ReportStatus::Delivered,
            ReportStatus::Amended,
            ReportStatus::Cancelled,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
    }

    #[test]
    fn test_editability() {
        assert!(sample_report(ReportStatus::Draft, false).is_editable());
        assert!(sample_report(ReportStatus::PendingEntry, false).is_editable());
        assert!(!sample_report(ReportStatus::PendingEntry, true).is_editable());
        assert!(!sample_report(ReportStatus::Approved, true).is_editable());
        assert!(!sample_report(ReportStatus::Delivered, true).is_editable());
    }

    #[test]
    fn test_critical_value_acknowledgement_state() {
        let mut cv = CriticalValue::new("hemoglobin", "Hemoglobin", json!(6.5), "below 7.0");
        assert!(!cv.is_acknowledged());
        cv.acknowledged_by = Some(ActorId::new("dr-patel").unwrap());
        cv.acknowledged_at = Some(Utc::now());
        assert!(cv.is_acknowledged());
    }

    #[test]
    fn test_unacknowledged_critical_lookup() {
        let mut report = sample_report(ReportStatus::Draft, false);
        report.critical_values.push(CriticalValue::new(
            "hemoglobin",
            "Hemoglobin",
            json!(6.5),
            "below 7.0",
        ));

        assert!(report.unacknowledged_critical("hemoglobin").is_some());
        assert!(report.unacknowledged_critical("wbc_count").is_none());
    }

    #[test]
    fn test_report_serialization_roundtrip() {
        let mut report = sample_report(ReportStatus::PendingQc, false);
        report.results.insert("hemoglobin".to_string(), json!(13.2));
        let json = serde_json::to_string(&report).unwrap();
        let deserialized: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(report, deserialized);
    }
}
