//! Integration tests for the report workflow engine
//!
//! Drives full report lifecycles over the in-memory adapters: creation,
//! result entry, QC, sign-off, delivery, amendment, locking, critical-value
//! handling, and the audit trail.

use assay::adapters::memory::{
    InMemoryAuditSink, InMemoryPatientDirectory, InMemoryReportStore, InMemoryTemplateStore,
    RecordingNotificationSink,
};
use assay::adapters::{ReportStore, TemplateStore};
use assay::core::workflow::{CreateReportInput, ReportEngine};
use assay::domain::{
    ActorId, AssayError, AuditAction, Field, FieldType, Gender, OrderId, PatientContext,
    PatientId, RangeSpec, ReferenceRange, ReportCategory, ReportStatus, Template, TemplateCode,
    TemplateType, TenantId,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

struct Harness {
    engine: ReportEngine,
    templates: Arc<InMemoryTemplateStore>,
    reports: Arc<InMemoryReportStore>,
    notifier: Arc<RecordingNotificationSink>,
    audit: Arc<InMemoryAuditSink>,
}

async fn harness() -> Harness {
    let templates = Arc::new(InMemoryTemplateStore::new());
    let reports = Arc::new(InMemoryReportStore::new());
    let patients = Arc::new(InMemoryPatientDirectory::new());
    let notifier = Arc::new(RecordingNotificationSink::new());
    let audit = Arc::new(InMemoryAuditSink::new());

    templates.seed(cbc_template(None)).await;
    patients
        .register(
            patient_id(),
            PatientContext::new(40.0, Gender::Male),
            Some("oncall@hospital.test".to_string()),
        )
        .await;

    let engine = ReportEngine::new(
        templates.clone(),
        reports.clone(),
        patients,
        notifier.clone(),
        audit.clone(),
    )
    .unwrap();

    Harness {
        engine,
        templates,
        reports,
        notifier,
        audit,
    }
}

fn cbc_template(tenant: Option<&str>) -> Template {
    let mut by_gender = BTreeMap::new();
    by_gender.insert(
        Gender::Male,
        RangeSpec::band(13.0, 17.0).with_critical(Some(7.0), Some(20.0)),
    );
    by_gender.insert(
        Gender::Female,
        RangeSpec::band(12.0, 15.5).with_critical(Some(7.0), Some(20.0)),
    );

    let mut builder = Template::builder()
        .code(TemplateCode::new("CBC").unwrap())
        .name("Complete Blood Count")
        .category(ReportCategory::Hematology)
        .template_type(TemplateType::Tabular)
        .field(
            Field::new("hemoglobin", "Hemoglobin", FieldType::Number)
                .with_unit("g/dL")
                .required(),
        )
        .field(Field::new("wbc_count", "WBC Count", FieldType::Number).with_unit("x10^3/uL"))
        .reference_range(
            "hemoglobin",
            ReferenceRange {
                by_gender,
                ..Default::default()
            },
        );
    if let Some(tenant) = tenant {
        builder = builder.tenant(TenantId::new(tenant).unwrap());
    }
    builder.build().unwrap()
}

fn patient_id() -> PatientId {
    PatientId::new("PT-0042").unwrap()
}

fn actor(name: &str) -> ActorId {
    ActorId::new(name).unwrap()
}

fn create_input(results: &[(&str, Value)]) -> CreateReportInput {
    CreateReportInput {
        template: "CBC".to_string(),
        tenant: None,
        patient_id: patient_id(),
        order_id: OrderId::new("ORD-9").unwrap(),
        results: results
            .iter()
            .map(|(code, value)| (code.to_string(), value.clone()))
            .collect(),
    }
}

fn values(entries: &[(&str, Value)]) -> BTreeMap<String, Value> {
    entries
        .iter()
        .map(|(code, value)| (code.to_string(), value.clone()))
        .collect()
}

#[tokio::test]
async fn full_lifecycle_entry_to_amendment() {
    let h = harness().await;
    let tech = actor("tech-17");
    let qc = actor("qc-3");
    let reviewer = actor("dr-patel");

    let report = h
        .engine
        .create_report(create_input(&[("hemoglobin", json!(13.2))]), &tech)
        .await
        .unwrap();
    assert_eq!(report.status, ReportStatus::Draft);
    assert!(!report.is_locked);

    let report = h.engine.submit_for_entry(&report.id, &tech).await.unwrap();
    assert_eq!(report.status, ReportStatus::PendingEntry);

    let report = h
        .engine
        .update_report_results(&report.id, values(&[("wbc_count", json!(5.4))]), &tech)
        .await
        .unwrap();
    // Merge never discards earlier values.
    assert_eq!(report.results["hemoglobin"], json!(13.2));
    assert_eq!(report.results["wbc_count"], json!(5.4));

    let report = h.engine.submit_for_qc(&report.id, &tech).await.unwrap();
    assert_eq!(report.status, ReportStatus::PendingQc);

    let report = h.engine.approve_qc(&report.id, &qc).await.unwrap();
    assert_eq!(report.status, ReportStatus::PendingReview);

    let report = h
        .engine
        .approve_report(&report.id, &reviewer, Some("sig:dr-patel".to_string()))
        .await
        .unwrap();
    assert_eq!(report.status, ReportStatus::Approved);
    assert!(report.is_locked);
    let sign_off = report.sign_off.as_ref().unwrap();
    assert_eq!(sign_off.approved_by, reviewer);
    assert_eq!(sign_off.signature.as_deref(), Some("sig:dr-patel"));

    // Direct edits are now permanently disallowed.
    let err = h
        .engine
        .update_report_results(&report.id, values(&[("hemoglobin", json!(9.9))]), &tech)
        .await
        .unwrap_err();
    assert!(matches!(err, AssayError::ReportLocked(_)));

    let report = h
        .engine
        .mark_delivered(&report.id, &reviewer, "portal")
        .await
        .unwrap();
    assert_eq!(report.status, ReportStatus::Delivered);
    assert!(report.is_locked);
    assert_eq!(report.delivery.as_ref().unwrap().channel, "portal");

    let report = h
        .engine
        .amend_report(
            &report.id,
            &reviewer,
            "corrected transcription error",
            values(&[("hemoglobin", json!(13.4))]),
        )
        .await
        .unwrap();
    assert_eq!(report.status, ReportStatus::Amended);
    assert_eq!(report.amendment_count(), 1);
    assert_eq!(report.results["hemoglobin"], json!(13.4));
    // Pre-amendment value stays recoverable.
    assert_eq!(report.amendments[0].previous_values["hemoglobin"], json!(13.2));
    assert_eq!(report.amendments[0].reason, "corrected transcription error");
}

#[tokio::test]
async fn report_numbers_are_sequential_per_category_day() {
    let h = harness().await;
    let tech = actor("tech-17");

    let first = h
        .engine
        .create_report(create_input(&[("hemoglobin", json!(13.0))]), &tech)
        .await
        .unwrap();
    let second = h
        .engine
        .create_report(create_input(&[("hemoglobin", json!(14.0))]), &tech)
        .await
        .unwrap();

    assert!(first.report_number.starts_with("HEM"));
    assert!(first.report_number.ends_with("0001"));
    assert!(second.report_number.ends_with("0002"));
    assert_eq!(first.report_number.len(), "HEM".len() + 6 + 4);
}

#[tokio::test]
async fn critical_value_at_creation_notifies_and_audits() {
    let h = harness().await;
    let tech = actor("tech-17");

    let report = h
        .engine
        .create_report(create_input(&[("hemoglobin", json!(6.5))]), &tech)
        .await
        .unwrap();

    assert_eq!(report.critical_values.len(), 1);

    let sent = h.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "oncall@hospital.test");
    assert_eq!(sent[0].report_number, report.report_number);
    assert_eq!(sent[0].critical_count, 1);

    let entries = h.audit.entries().await;
    assert!(entries
        .iter()
        .any(|e| matches!(e.action, AuditAction::ReportCreated)));
    assert!(entries
        .iter()
        .any(|e| matches!(e.action, AuditAction::CriticalValuesDetected { count: 1 })));
}

#[tokio::test]
async fn notification_failure_does_not_fail_creation() {
    let h = harness().await;
    h.notifier.set_failing(true);

    let report = h
        .engine
        .create_report(create_input(&[("hemoglobin", json!(6.5))]), &actor("tech-17"))
        .await
        .unwrap();

    // The report exists despite the notification outage.
    assert!(h.reports.load(&report.id).await.unwrap().is_some());
    assert!(h.notifier.sent().await.is_empty());
}

#[tokio::test]
async fn audit_failure_fails_transition_and_preserves_status() {
    let h = harness().await;
    let tech = actor("tech-17");

    let report = h
        .engine
        .create_report(create_input(&[("hemoglobin", json!(13.0))]), &tech)
        .await
        .unwrap();

    h.audit.set_failing(true);
    let err = h.engine.submit_for_entry(&report.id, &tech).await.unwrap_err();
    assert!(matches!(err, AssayError::AuditWrite(_)));

    // The persisted status is unchanged.
    let stored = h.reports.load(&report.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ReportStatus::Draft);
}

#[tokio::test]
async fn submit_for_qc_blocks_on_missing_required_field() {
    let h = harness().await;
    let tech = actor("tech-17");

    let report = h
        .engine
        .create_report(create_input(&[]), &tech)
        .await
        .unwrap();
    let report = h.engine.submit_for_entry(&report.id, &tech).await.unwrap();

    let err = h.engine.submit_for_qc(&report.id, &tech).await.unwrap_err();
    match err {
        AssayError::Validation(errors) => {
            assert!(errors.iter().any(|e| e.field_code == "hemoglobin"));
        }
        other => panic!("expected Validation, got {other:?}"),
    }

    let stored = h.reports.load(&report.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ReportStatus::PendingEntry);
}

#[tokio::test]
async fn invalid_transition_leaves_status_unchanged() {
    let h = harness().await;
    let tech = actor("tech-17");

    let report = h
        .engine
        .create_report(create_input(&[("hemoglobin", json!(13.0))]), &tech)
        .await
        .unwrap();

    // DRAFT cannot jump straight to APPROVED.
    let err = h
        .engine
        .approve_report(&report.id, &actor("dr-patel"), None)
        .await
        .unwrap_err();
    match err {
        AssayError::InvalidTransition { current, requested } => {
            assert_eq!(current, ReportStatus::Draft);
            assert_eq!(requested, ReportStatus::Approved);
        }
        other => panic!("expected InvalidTransition, got {other:?}"),
    }

    let stored = h.reports.load(&report.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ReportStatus::Draft);
}

#[tokio::test]
async fn rejections_require_reasons_and_return_upstream() {
    let h = harness().await;
    let tech = actor("tech-17");
    let qc = actor("qc-3");

    let report = h
        .engine
        .create_report(create_input(&[("hemoglobin", json!(13.0))]), &tech)
        .await
        .unwrap();
    let report = h.engine.submit_for_entry(&report.id, &tech).await.unwrap();
    let report = h.engine.submit_for_qc(&report.id, &tech).await.unwrap();

    // Blank reason is rejected.
    assert!(h.engine.reject_qc(&report.id, &qc, "  ").await.is_err());

    let report = h
        .engine
        .reject_qc(&report.id, &qc, "smudged slide")
        .await
        .unwrap();
    assert_eq!(report.status, ReportStatus::PendingEntry);
    assert_eq!(report.rejection_reason.as_deref(), Some("smudged slide"));
}

#[tokio::test]
async fn amendments_are_additive_across_multiple_calls() {
    let h = harness().await;
    let tech = actor("tech-17");
    let reviewer = actor("dr-patel");

    let report = h
        .engine
        .create_report(create_input(&[("hemoglobin", json!(13.0))]), &tech)
        .await
        .unwrap();
    let report = h.engine.submit_for_entry(&report.id, &tech).await.unwrap();
    let report = h.engine.submit_for_qc(&report.id, &tech).await.unwrap();
    let report = h.engine.approve_qc(&report.id, &actor("qc-3")).await.unwrap();
    let report = h
        .engine
        .approve_report(&report.id, &reviewer, None)
        .await
        .unwrap();

    let report = h
        .engine
        .amend_report(
            &report.id,
            &reviewer,
            "first correction",
            values(&[("hemoglobin", json!(13.5))]),
        )
        .await
        .unwrap();
    let report = h
        .engine
        .amend_report(
            &report.id,
            &reviewer,
            "second correction",
            values(&[("hemoglobin", json!(13.7))]),
        )
        .await
        .unwrap();

    assert_eq!(report.amendment_count(), 2);
    assert_eq!(report.amendments[0].amendment_number, 1);
    assert_eq!(report.amendments[1].amendment_number, 2);
    // The original value survives both amendments.
    assert_eq!(report.amendments[0].previous_values["hemoglobin"], json!(13.0));
    assert_eq!(report.amendments[1].previous_values["hemoglobin"], json!(13.5));
    assert_eq!(report.results["hemoglobin"], json!(13.7));

    // Amendment without a reason is a validation error.
    assert!(h
        .engine
        .amend_report(&report.id, &reviewer, "", values(&[("hemoglobin", json!(14.0))]))
        .await
        .is_err());
}

#[tokio::test]
async fn manual_lock_blocks_edits_until_unlocked_with_reason() {
    let h = harness().await;
    let tech = actor("tech-17");
    let admin = actor("admin-1");

    let report = h
        .engine
        .create_report(create_input(&[("hemoglobin", json!(13.0))]), &tech)
        .await
        .unwrap();

    let report = h.engine.lock_report(&report.id, &admin).await.unwrap();
    assert!(report.is_locked);

    let err = h
        .engine
        .update_report_results(&report.id, values(&[("wbc_count", json!(5.0))]), &tech)
        .await
        .unwrap_err();
    assert!(matches!(err, AssayError::ReportLocked(_)));

    // Unlock demands a reason.
    assert!(h.engine.unlock_report(&report.id, &admin, "").await.is_err());

    let report = h
        .engine
        .unlock_report(&report.id, &admin, "entered against wrong order")
        .await
        .unwrap();
    assert!(!report.is_locked);

    h.engine
        .update_report_results(&report.id, values(&[("wbc_count", json!(5.0))]), &tech)
        .await
        .unwrap();

    let entries = h.audit.entries().await;
    assert!(entries
        .iter()
        .any(|e| matches!(e.action, AuditAction::ReportLocked)));
    assert!(entries.iter().any(|e| {
        matches!(e.action, AuditAction::ReportUnlocked)
            && e.details.as_deref() == Some("entered against wrong order")
    }));
}

#[tokio::test]
async fn acknowledge_critical_value_stamps_without_status_change() {
    let h = harness().await;
    let tech = actor("tech-17");
    let clinician = actor("dr-rao");

    let report = h
        .engine
        .create_report(create_input(&[("hemoglobin", json!(6.5))]), &tech)
        .await
        .unwrap();
    let status_before = report.status;

    let report = h
        .engine
        .acknowledge_critical_value(&report.id, &clinician, "hemoglobin")
        .await
        .unwrap();

    assert_eq!(report.status, status_before);
    let critical = &report.critical_values[0];
    assert_eq!(critical.acknowledged_by.as_ref(), Some(&clinician));
    assert!(critical.acknowledged_at.is_some());

    // A second acknowledgement of the same entry has nothing to stamp.
    assert!(h
        .engine
        .acknowledge_critical_value(&report.id, &clinician, "hemoglobin")
        .await
        .is_err());
}

#[tokio::test]
async fn cancelled_report_is_terminal() {
    let h = harness().await;
    let tech = actor("tech-17");

    let report = h
        .engine
        .create_report(create_input(&[("hemoglobin", json!(13.0))]), &tech)
        .await
        .unwrap();
    let report = h
        .engine
        .cancel_report(&report.id, &tech, "duplicate order")
        .await
        .unwrap();
    assert_eq!(report.status, ReportStatus::Cancelled);

    // No outgoing transitions from CANCELLED.
    assert!(h.engine.submit_for_entry(&report.id, &tech).await.is_err());

    // The report record itself still exists (never hard-deleted).
    assert!(h.reports.load(&report.id).await.unwrap().is_some());
}

#[tokio::test]
async fn every_transition_writes_an_audit_entry() {
    let h = harness().await;
    let tech = actor("tech-17");

    let report = h
        .engine
        .create_report(create_input(&[("hemoglobin", json!(13.0))]), &tech)
        .await
        .unwrap();
    h.engine.submit_for_entry(&report.id, &tech).await.unwrap();
    h.engine.submit_for_qc(&report.id, &tech).await.unwrap();

    let entries = h.audit.entries().await;
    let status_changes: Vec<_> = entries
        .iter()
        .filter_map(|e| match &e.action {
            AuditAction::StatusChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();

    assert_eq!(
        status_changes,
        vec![
            (ReportStatus::Draft, ReportStatus::PendingEntry),
            (ReportStatus::PendingEntry, ReportStatus::PendingQc),
        ]
    );
}

#[tokio::test]
async fn tenant_template_clone_shadows_system_template() {
    let h = harness().await;
    let admin = actor("admin-1");
    let tenant = TenantId::new("city-hospital").unwrap();

    let copy = h
        .engine
        .clone_system_template(&TemplateCode::new("CBC").unwrap(), tenant.clone(), &admin)
        .await
        .unwrap();
    assert_eq!(copy.tenant, Some(tenant.clone()));

    // Tenant-scoped creation resolves the tenant copy; system callers keep
    // the system template.
    let mut input = create_input(&[("hemoglobin", json!(13.0))]);
    input.tenant = Some(tenant);
    let report = h.engine.create_report(input, &actor("tech-17")).await.unwrap();
    assert_eq!(report.template_id, copy.id);

    let system_report = h
        .engine
        .create_report(create_input(&[("hemoglobin", json!(13.0))]), &actor("tech-17"))
        .await
        .unwrap();
    assert_ne!(system_report.template_id, copy.id);
}

#[tokio::test]
async fn template_versioning_deactivates_old_version() {
    let h = harness().await;
    let admin = actor("admin-1");
    let tenant = TenantId::new("city-hospital").unwrap();

    let v1 = h
        .engine
        .clone_system_template(&TemplateCode::new("CBC").unwrap(), tenant, &admin)
        .await
        .unwrap();

    let v2 = h
        .engine
        .activate_template_version(&v1.id, &admin)
        .await
        .unwrap();
    assert_eq!(v2.version, 2);
    assert!(v2.active);

    let stored_v1 = h.templates.find_by_id(&v1.id).await.unwrap().unwrap();
    assert!(!stored_v1.active);
}

#[tokio::test]
async fn system_templates_cannot_be_versioned() {
    let h = harness().await;
    let system = h
        .templates
        .find_active_by_code(&TemplateCode::new("CBC").unwrap(), None)
        .await
        .unwrap()
        .unwrap();

    let err = h
        .engine
        .activate_template_version(&system.id, &actor("admin-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, AssayError::SystemTemplateReadOnly(_)));
}

#[tokio::test]
async fn get_rendered_report_returns_view_with_patient() {
    let h = harness().await;
    let report = h
        .engine
        .create_report(create_input(&[("hemoglobin", json!(13.2))]), &actor("tech-17"))
        .await
        .unwrap();

    let (stored, rendered, patient) = h.engine.get_rendered_report(&report.id).await.unwrap();
    assert_eq!(stored.id, report.id);
    assert_eq!(rendered.template_code, "CBC");
    assert_eq!(patient.gender, Some(Gender::Male));

    // Re-rendering the unchanged report reproduces the persisted derived
    // state.
    assert_eq!(rendered.calculated_values, stored.calculated_values);
}

#[tokio::test]
async fn check_critical_values_without_patient_context() {
    let h = harness().await;
    let check = h
        .engine
        .check_critical_values(
            "CBC",
            &values(&[("hemoglobin", json!(6.0))]),
            None,
        )
        .await
        .unwrap();

    // Without demographics the gender band is unresolved; the global
    // critical table still catches hemoglobin 6.0.
    assert!(check.has_critical_values);
    assert!(check.requires_notification);
    assert_eq!(check.critical_values[0].field_code, "hemoglobin");
}

#[tokio::test]
async fn unknown_template_is_fatal() {
    let h = harness().await;
    let err = h
        .engine
        .validate_report_data("NOPE", &BTreeMap::new(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AssayError::TemplateNotFound(_)));
}

#[tokio::test]
async fn unregistered_patient_is_fatal_at_creation() {
    let h = harness().await;
    let mut input = create_input(&[("hemoglobin", json!(13.0))]);
    input.patient_id = PatientId::new("PT-UNKNOWN").unwrap();

    let err = h
        .engine
        .create_report(input, &actor("tech-17"))
        .await
        .unwrap_err();
    assert!(matches!(err, AssayError::PatientNotFound(_)));
}
