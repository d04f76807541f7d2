//! Report workflow engine
//!
//! Owns the report lifecycle: creation from a template, result mutation,
//! state transitions, locking, amendment, and audit logging. Rendering is
//! delegated to [`RenderEngine`]; persistence and fan-out go through the
//! collaborator traits in [`crate::adapters::traits`].
//!
//! Every transition and mutating operation writes its audit entry before
//! the operation returns; a failed audit write fails the operation. A failed
//! critical-value notification is logged and never rolls back the
//! underlying transition.
//!
//! Concurrency: each operation loads the report, mutates a copy, and
//! persists with a revision check, so two conflicting operations on the
//! same report cannot both succeed. Operations on different reports are
//! fully independent.

pub mod numbering;
pub mod transitions;
pub mod validate;

use crate::adapters::traits::{
    AuditSink, NotificationSink, PatientDirectory, ReportStore, TemplateStore,
};
use crate::core::render::{RenderEngine, RenderInput};
use crate::core::render::rendered::RenderedReport;
use crate::domain::audit::{AuditAction, AuditLogEntry};
use crate::domain::errors::AssayError;
use crate::domain::ids::{ActorId, OrderId, PatientId, ReportId, TemplateCode, TemplateId, TenantId};
use crate::domain::patient::PatientContext;
use crate::domain::report::{
    Amendment, CriticalValue, Delivery, Report, ReportStatus, SignOff,
};
use crate::domain::template::Template;
use crate::domain::Result;
use chrono::Utc;
use numbering::format_report_number;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use transitions::{transition_target, WorkflowAction};
use validate::{validate_results, ValidationOutcome};

/// Input to [`ReportEngine::create_report`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReportInput {
    /// Template selector: a template id or a template code
    pub template: String,

    /// Tenant scope resolving the template (system fallback applies)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<TenantId>,

    /// Subject patient
    pub patient_id: PatientId,

    /// Originating order
    pub order_id: OrderId,

    /// Initial raw results; may be empty for entry-later workflows
    #[serde(default)]
    pub results: BTreeMap<String, Value>,
}

/// Outcome of [`ReportEngine::check_critical_values`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalCheck {
    /// Whether any critical value was detected
    pub has_critical_values: bool,

    /// The detected critical values, ordered
    pub critical_values: Vec<CriticalValue>,

    /// Whether a clinician notification is required
    pub requires_notification: bool,
}

/// The report workflow engine
///
/// Thread-safe; share via `Arc` across tasks. All collaborator access goes
/// through the injected trait objects.
pub struct ReportEngine {
    templates: Arc<dyn TemplateStore>,
    reports: Arc<dyn ReportStore>,
    patients: Arc<dyn PatientDirectory>,
    notifier: Arc<dyn NotificationSink>,
    audit: Arc<dyn AuditSink>,
    render: RenderEngine,
}

impl ReportEngine {
    /// Creates a workflow engine over the given collaborators
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the render engine fails to
    /// initialize.
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        reports: Arc<dyn ReportStore>,
        patients: Arc<dyn PatientDirectory>,
        notifier: Arc<dyn NotificationSink>,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self> {
        Ok(Self {
            templates,
            reports,
            patients,
            notifier,
            audit,
            render: RenderEngine::new()?,
        })
    }

    // ------------------------------------------------------------------
    // Stateless engine operations
    // ------------------------------------------------------------------

    /// Renders a result set against a template without touching any report
    pub async fn render_report(
        &self,
        template_selector: &str,
        input: &RenderInput,
        tenant: Option<&TenantId>,
    ) -> Result<RenderedReport> {
        let template = self.resolve_template(template_selector, tenant).await?;
        self.render.render(&template, input)
    }

    /// Validates a result set against a template's field definitions
    pub async fn validate_report_data(
        &self,
        template_selector: &str,
        results: &BTreeMap<String, Value>,
        tenant: Option<&TenantId>,
    ) -> Result<ValidationOutcome> {
        let template = self.resolve_template(template_selector, tenant).await?;
        Ok(validate_results(&template, results))
    }

    /// Checks a result set for critical values without patient context
    pub async fn check_critical_values(
        &self,
        template_selector: &str,
        results: &BTreeMap<String, Value>,
        tenant: Option<&TenantId>,
    ) -> Result<CriticalCheck> {
        let template = self.resolve_template(template_selector, tenant).await?;
        let input = RenderInput::new(PatientContext::default(), results.clone());
        let rendered = self.render.render(&template, &input)?;
        Ok(CriticalCheck {
            has_critical_values: rendered.has_critical_values(),
            requires_notification: rendered.has_critical_values(),
            critical_values: rendered.critical_values,
        })
    }

    // ------------------------------------------------------------------
    // Report creation and result entry
    // ------------------------------------------------------------------

    /// Creates a report from a template snapshot
    ///
    /// Generates the report number, performs the initial render to seed
    /// calculated values / interpretations / critical values, and persists
    /// the report in `DRAFT`. Critical values detected at creation trigger
    /// notification immediately.
    pub async fn create_report(
        &self,
        input: CreateReportInput,
        actor: &ActorId,
    ) -> Result<Report> {
        let template = self
            .resolve_template(&input.template, input.tenant.as_ref())
            .await?;
        let patient = self.require_patient(&input.patient_id).await?;

        let render_input = RenderInput::new(patient, input.results.clone());
        let rendered = self.render.render(&template, &render_input)?;

        let today = Utc::now().date_naive();
        let sequence = self
            .reports
            .next_sequence(template.category.prefix(), today)
            .await?;
        let report_number = format_report_number(template.category.prefix(), today, sequence);

        let now = Utc::now();
        let report = Report {
            id: ReportId::generate(),
            report_number,
            template_id: template.id,
            template_version: template.version,
            patient_id: input.patient_id.clone(),
            order_id: input.order_id.clone(),
            tenant: input.tenant.clone(),
            results: input.results,
            calculated_values: rendered.calculated_values.clone(),
            interpretations: rendered.interpretations.clone(),
            critical_values: rendered.critical_values.clone(),
            status: ReportStatus::Draft,
            is_locked: false,
            amendments: Vec::new(),
            sign_off: None,
            delivery: None,
            rejection_reason: None,
            revision: 0,
            created_at: now,
            updated_at: now,
        };

        self.audit
            .append(
                &AuditLogEntry::for_report(report.id, AuditAction::ReportCreated, actor.clone())
                    .with_details(format!(
                        "template {} v{}, checksum {}",
                        template.code, template.version, rendered.checksum
                    )),
            )
            .await?;

        if rendered.has_critical_values() {
            self.audit
                .append(&AuditLogEntry::for_report(
                    report.id,
                    AuditAction::CriticalValuesDetected {
                        count: rendered.critical_values.len(),
                    },
                    actor.clone(),
                ))
                .await?;
        }

        self.reports.insert(&report).await?;

        if rendered.has_critical_values() {
            self.try_notify(&report).await;
        }

        tracing::info!(
            report_id = %report.id,
            report_number = %report.report_number,
            template_code = %template.code,
            critical_values = report.critical_values.len(),
            "Report created"
        );

        Ok(report)
    }

    /// Merges new raw values into an editable report and re-renders
    ///
    /// Unspecified fields are never discarded. Locked reports and reports at
    /// or past sign-off reject the call; those require the amendment path.
    pub async fn update_report_results(
        &self,
        report_id: &ReportId,
        new_values: BTreeMap<String, Value>,
        actor: &ActorId,
    ) -> Result<Report> {
        let mut report = self.require_report(report_id).await?;
        if !report.is_editable() {
            return Err(AssayError::ReportLocked(report.id.to_string()));
        }
        let loaded_revision = report.revision;

        let template = self.require_template(&report.template_id).await?;
        let patient = self.require_patient(&report.patient_id).await?;

        let previous: BTreeMap<String, Value> = new_values
            .keys()
            .map(|k| (k.clone(), report.results.get(k).cloned().unwrap_or(Value::Null)))
            .collect();

        for (code, value) in &new_values {
            report.results.insert(code.clone(), value.clone());
        }

        let render_input = RenderInput::new(patient, report.results.clone());
        let rendered = self.render.render(&template, &render_input)?;
        apply_render(&mut report, &rendered);
        report.revision += 1;

        self.audit
            .append(
                &AuditLogEntry::for_report(report.id, AuditAction::ResultsUpdated, actor.clone())
                    .with_values(previous, new_values),
            )
            .await?;

        if rendered.has_critical_values() {
            self.audit
                .append(&AuditLogEntry::for_report(
                    report.id,
                    AuditAction::CriticalValuesDetected {
                        count: rendered.critical_values.len(),
                    },
                    actor.clone(),
                ))
                .await?;
        }

        self.reports.update(&report, loaded_revision).await?;

        if rendered.has_critical_values() {
            self.try_notify(&report).await;
        }

        Ok(report)
    }

    // ------------------------------------------------------------------
    // Lifecycle transitions
    // ------------------------------------------------------------------

    /// `DRAFT -> PENDING_ENTRY`
    pub async fn submit_for_entry(&self, report_id: &ReportId, actor: &ActorId) -> Result<Report> {
        self.apply_transition(report_id, WorkflowAction::SubmitForEntry, actor, None, |_| {})
            .await
    }

    /// `PENDING_ENTRY -> PENDING_QC`, after full validation
    ///
    /// Validation failure blocks the transition with a field-level error
    /// list; the persisted status is unchanged.
    pub async fn submit_for_qc(&self, report_id: &ReportId, actor: &ActorId) -> Result<Report> {
        let report = self.require_report(report_id).await?;
        let template = self.require_template(&report.template_id).await?;
        let outcome = validate_results(&template, &report.results);
        if !outcome.valid {
            return Err(AssayError::Validation(outcome.errors));
        }

        self.apply_transition(report_id, WorkflowAction::SubmitForQc, actor, None, |_| {})
            .await
    }

    /// `PENDING_QC -> PENDING_REVIEW`
    pub async fn approve_qc(&self, report_id: &ReportId, actor: &ActorId) -> Result<Report> {
        self.apply_transition(report_id, WorkflowAction::ApproveQc, actor, None, |report| {
            report.rejection_reason = None;
        })
        .await
    }

    /// `PENDING_QC -> PENDING_ENTRY`, reason mandatory
    pub async fn reject_qc(
        &self,
        report_id: &ReportId,
        actor: &ActorId,
        reason: &str,
    ) -> Result<Report> {
        let reason = require_reason(reason, "rejectQC")?;
        self.apply_transition(
            report_id,
            WorkflowAction::RejectQc,
            actor,
            Some(reason.clone()),
            move |report| {
                report.rejection_reason = Some(reason);
            },
        )
        .await
    }

    /// `PENDING_REVIEW -> APPROVED`: the sign-off point
    ///
    /// Re-validates, locks the report, and stamps reviewer identity,
    /// timestamp, and optional signature metadata. Direct edits are
    /// permanently disallowed afterwards.
    pub async fn approve_report(
        &self,
        report_id: &ReportId,
        actor: &ActorId,
        signature: Option<String>,
    ) -> Result<Report> {
        let report = self.require_report(report_id).await?;
        let template = self.require_template(&report.template_id).await?;
        let outcome = validate_results(&template, &report.results);
        if !outcome.valid {
            return Err(AssayError::Validation(outcome.errors));
        }

        let approved_by = actor.clone();
        self.apply_transition(report_id, WorkflowAction::Approve, actor, None, move |report| {
            report.is_locked = true;
            report.rejection_reason = None;
            report.sign_off = Some(SignOff {
                approved_by,
                approved_at: Utc::now(),
                signature,
            });
        })
        .await
    }

    /// `PENDING_REVIEW -> PENDING_QC`, reason mandatory
    pub async fn reject_report(
        &self,
        report_id: &ReportId,
        actor: &ActorId,
        reason: &str,
    ) -> Result<Report> {
        let reason = require_reason(reason, "rejectReport")?;
        self.apply_transition(
            report_id,
            WorkflowAction::Reject,
            actor,
            Some(reason.clone()),
            move |report| {
                report.rejection_reason = Some(reason);
            },
        )
        .await
    }

    /// `APPROVED|AMENDED -> DELIVERED`; the report stays locked
    pub async fn mark_delivered(
        &self,
        report_id: &ReportId,
        actor: &ActorId,
        channel: &str,
    ) -> Result<Report> {
        if channel.trim().is_empty() {
            return Err(AssayError::validation(
                "channel",
                "markDelivered requires a delivery channel",
            ));
        }
        let channel = channel.trim().to_string();
        self.apply_transition(
            report_id,
            WorkflowAction::MarkDelivered,
            actor,
            Some(format!("delivered via {channel}")),
            move |report| {
                report.delivery = Some(Delivery {
                    channel,
                    delivered_at: Utc::now(),
                });
            },
        )
        .await
    }

    /// Cancels an unsigned report; terminal, reason mandatory
    pub async fn cancel_report(
        &self,
        report_id: &ReportId,
        actor: &ActorId,
        reason: &str,
    ) -> Result<Report> {
        let reason = require_reason(reason, "cancelReport")?;
        self.apply_transition(
            report_id,
            WorkflowAction::Cancel,
            actor,
            Some(reason),
            |_| {},
        )
        .await
    }

    /// Applies a post-sign-off amendment
    ///
    /// Only valid from `APPROVED`, `DELIVERED`, or `AMENDED`. Appends an
    /// amendment record capturing prior values, new values, reason, and a
    /// monotonically increasing amendment number, re-renders with the
    /// merged values, and sets status `AMENDED`. Original result history is
    /// never overwritten.
    pub async fn amend_report(
        &self,
        report_id: &ReportId,
        actor: &ActorId,
        reason: &str,
        new_values: BTreeMap<String, Value>,
    ) -> Result<Report> {
        let reason = require_reason(reason, "amendReport")?;
        if new_values.is_empty() {
            return Err(AssayError::validation(
                "results",
                "amendReport requires at least one changed value",
            ));
        }

        let mut report = self.require_report(report_id).await?;
        let loaded_revision = report.revision;
        let target = transition_target(report.status, WorkflowAction::Amend)?;

        let template = self.require_template(&report.template_id).await?;
        let patient = self.require_patient(&report.patient_id).await?;

        let previous: BTreeMap<String, Value> = new_values
            .keys()
            .map(|k| (k.clone(), report.results.get(k).cloned().unwrap_or(Value::Null)))
            .collect();
        let fields_changed: Vec<String> = new_values.keys().cloned().collect();

        for (code, value) in &new_values {
            report.results.insert(code.clone(), value.clone());
        }

        let render_input = RenderInput::new(patient, report.results.clone());
        let rendered = self.render.render(&template, &render_input)?;
        apply_render(&mut report, &rendered);

        let amendment_number = report.amendment_count() + 1;
        report.amendments.push(Amendment {
            amendment_number,
            amended_at: Utc::now(),
            amended_by: actor.clone(),
            reason: reason.clone(),
            previous_values: previous.clone(),
            new_values: new_values.clone(),
            fields_changed,
        });
        report.status = target;
        report.revision += 1;
        report.updated_at = Utc::now();

        self.audit
            .append(
                &AuditLogEntry::for_report(
                    report.id,
                    AuditAction::ReportAmended { amendment_number },
                    actor.clone(),
                )
                .with_values(previous, new_values)
                .with_details(reason),
            )
            .await?;

        self.reports.update(&report, loaded_revision).await?;

        if rendered.has_critical_values() {
            self.try_notify(&report).await;
        }

        Ok(report)
    }

    // ------------------------------------------------------------------
    // Locking and acknowledgement
    // ------------------------------------------------------------------

    /// Manually locks a report, outside the normal transition sequence
    pub async fn lock_report(&self, report_id: &ReportId, actor: &ActorId) -> Result<Report> {
        let mut report = self.require_report(report_id).await?;
        let loaded_revision = report.revision;
        report.is_locked = true;
        report.revision += 1;
        report.updated_at = Utc::now();

        self.audit
            .append(&AuditLogEntry::for_report(
                report.id,
                AuditAction::ReportLocked,
                actor.clone(),
            ))
            .await?;
        self.reports.update(&report, loaded_revision).await?;
        Ok(report)
    }

    /// Manually unlocks a report; a non-empty reason is mandatory and the
    /// unlock is always logged
    pub async fn unlock_report(
        &self,
        report_id: &ReportId,
        actor: &ActorId,
        reason: &str,
    ) -> Result<Report> {
        let reason = require_reason(reason, "unlockReport")?;
        let mut report = self.require_report(report_id).await?;
        let loaded_revision = report.revision;
        report.is_locked = false;
        report.revision += 1;
        report.updated_at = Utc::now();

        self.audit
            .append(
                &AuditLogEntry::for_report(report.id, AuditAction::ReportUnlocked, actor.clone())
                    .with_details(reason),
            )
            .await?;
        self.reports.update(&report, loaded_revision).await?;
        Ok(report)
    }

    /// Acknowledges a critical value: stamps who/when without altering
    /// report status
    ///
    /// Acknowledgement and clinical sign-off are independent concerns.
    pub async fn acknowledge_critical_value(
        &self,
        report_id: &ReportId,
        actor: &ActorId,
        field_code: &str,
    ) -> Result<Report> {
        let mut report = self.require_report(report_id).await?;
        let loaded_revision = report.revision;

        match report.unacknowledged_critical(field_code) {
            Some(critical) => {
                critical.acknowledged_by = Some(actor.clone());
                critical.acknowledged_at = Some(Utc::now());
            }
            None => {
                return Err(AssayError::validation(
                    field_code,
                    "no unacknowledged critical value for this field",
                ));
            }
        }
        report.revision += 1;
        report.updated_at = Utc::now();

        self.audit
            .append(&AuditLogEntry::for_report(
                report.id,
                AuditAction::CriticalValueAcknowledged {
                    field_code: field_code.to_string(),
                },
                actor.clone(),
            ))
            .await?;
        self.reports.update(&report, loaded_revision).await?;
        Ok(report)
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Loads a report together with a fresh render and the patient context,
    /// for print/view
    pub async fn get_rendered_report(
        &self,
        report_id: &ReportId,
    ) -> Result<(Report, RenderedReport, PatientContext)> {
        let report = self.require_report(report_id).await?;
        let template = self.require_template(&report.template_id).await?;
        let patient = self.require_patient(&report.patient_id).await?;

        let render_input = RenderInput::new(patient.clone(), report.results.clone());
        let rendered = self.render.render(&template, &render_input)?;
        Ok((report, rendered, patient))
    }

    // ------------------------------------------------------------------
    // Template management
    // ------------------------------------------------------------------

    /// Clones a system template into a tenant-owned copy
    ///
    /// The only customization path for system templates; the source is
    /// never mutated.
    pub async fn clone_system_template(
        &self,
        code: &TemplateCode,
        tenant: TenantId,
        actor: &ActorId,
    ) -> Result<Template> {
        let system = self
            .templates
            .find_active_by_code(code, None)
            .await?
            .ok_or_else(|| AssayError::TemplateNotFound(code.to_string()))?;

        let copy = system.clone_for_tenant(tenant);
        self.audit
            .append(
                &AuditLogEntry::for_template(copy.id, AuditAction::TemplateCloned, actor.clone())
                    .with_details(format!("cloned from system template {}", system.id)),
            )
            .await?;
        self.templates.save(&copy).await?;
        Ok(copy)
    }

    /// Activates the successor version of a tenant template
    ///
    /// The old version is deactivated, never overwritten in place. System
    /// templates are read-only and cannot be versioned.
    pub async fn activate_template_version(
        &self,
        template_id: &TemplateId,
        actor: &ActorId,
    ) -> Result<Template> {
        let mut current = self.require_template(template_id).await?;
        if current.is_system() {
            return Err(AssayError::SystemTemplateReadOnly(current.code.to_string()));
        }

        current.active = false;
        self.templates.save(&current).await?;

        let next = current.next_version();
        self.audit
            .append(&AuditLogEntry::for_template(
                next.id,
                AuditAction::TemplateVersionActivated {
                    version: next.version,
                },
                actor.clone(),
            ))
            .await?;
        self.templates.save(&next).await?;
        Ok(next)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Resolves a template by id or code, with tenant -> system fallback
    async fn resolve_template(
        &self,
        selector: &str,
        tenant: Option<&TenantId>,
    ) -> Result<Template> {
        if let Ok(id) = TemplateId::parse(selector) {
            let template = self
                .templates
                .find_by_id(&id)
                .await?
                .ok_or_else(|| AssayError::TemplateNotFound(selector.to_string()))?;
            // Tenant templates are only visible to their tenant.
            if template.tenant.is_some() && template.tenant.as_ref() != tenant {
                return Err(AssayError::TemplateNotFound(selector.to_string()));
            }
            return Ok(template);
        }

        let code = TemplateCode::from_str(selector)
            .map_err(|_| AssayError::TemplateNotFound(selector.to_string()))?;

        if let Some(tenant) = tenant {
            if let Some(template) = self
                .templates
                .find_active_by_code(&code, Some(tenant))
                .await?
            {
                return Ok(template);
            }
        }

        self.templates
            .find_active_by_code(&code, None)
            .await?
            .ok_or_else(|| AssayError::TemplateNotFound(selector.to_string()))
    }

    async fn require_report(&self, report_id: &ReportId) -> Result<Report> {
        self.reports
            .load(report_id)
            .await?
            .ok_or_else(|| AssayError::ReportNotFound(report_id.to_string()))
    }

    async fn require_template(&self, template_id: &TemplateId) -> Result<Template> {
        self.templates
            .find_by_id(template_id)
            .await?
            .ok_or_else(|| AssayError::TemplateNotFound(template_id.to_string()))
    }

    async fn require_patient(&self, patient_id: &PatientId) -> Result<PatientContext> {
        self.patients
            .patient_context(patient_id)
            .await?
            .ok_or_else(|| AssayError::PatientNotFound(patient_id.to_string()))
    }

    /// Shared transition path: validate against the table, mutate, audit,
    /// persist with revision check
    async fn apply_transition(
        &self,
        report_id: &ReportId,
        action: WorkflowAction,
        actor: &ActorId,
        details: Option<String>,
        mutate: impl FnOnce(&mut Report),
    ) -> Result<Report> {
        let mut report = self.require_report(report_id).await?;
        let loaded_revision = report.revision;
        let from = report.status;
        let to = transition_target(from, action)?;

        report.status = to;
        mutate(&mut report);
        report.revision += 1;
        report.updated_at = Utc::now();

        let mut entry = AuditLogEntry::for_report(
            report.id,
            AuditAction::StatusChanged { from, to },
            actor.clone(),
        );
        if let Some(details) = details {
            entry = entry.with_details(details);
        }
        self.audit.append(&entry).await?;

        self.reports.update(&report, loaded_revision).await?;

        tracing::info!(
            report_id = %report.id,
            action = %action,
            from = %from,
            to = %to,
            "Report transition applied"
        );

        Ok(report)
    }

    /// Best-effort critical-value notification; failures are logged and
    /// never propagate
    async fn try_notify(&self, report: &Report) {
        let recipient = match self.patients.critical_contact(&report.patient_id).await {
            Ok(Some(recipient)) => recipient,
            Ok(None) => {
                tracing::warn!(
                    report_id = %report.id,
                    patient_id = %report.patient_id,
                    "No critical-value contact registered; notification skipped"
                );
                return;
            }
            Err(error) => {
                tracing::warn!(
                    report_id = %report.id,
                    error = %error,
                    "Critical-value contact lookup failed; notification skipped"
                );
                return;
            }
        };

        if let Err(error) = self
            .notifier
            .notify_critical(&recipient, &report.report_number, &report.critical_values)
            .await
        {
            tracing::warn!(
                report_id = %report.id,
                report_number = %report.report_number,
                error = %error,
                "Critical-value notification failed; transition unaffected"
            );
        }
    }
}

/// Copies derived render outputs onto the report, preserving existing
/// acknowledgement stamps for critical values that survived the re-render
fn apply_render(report: &mut Report, rendered: &RenderedReport) {
    let merged = merge_critical_acks(&report.critical_values, rendered.critical_values.clone());
    report.calculated_values = rendered.calculated_values.clone();
    report.interpretations = rendered.interpretations.clone();
    report.critical_values = merged;
    report.updated_at = Utc::now();
}

fn merge_critical_acks(
    previous: &[CriticalValue],
    mut fresh: Vec<CriticalValue>,
) -> Vec<CriticalValue> {
    for critical in fresh.iter_mut() {
        let earlier = previous.iter().find(|p| {
            p.field_code == critical.field_code
                && p.value == critical.value
                && p.is_acknowledged()
        });
        if let Some(earlier) = earlier {
            critical.acknowledged_by = earlier.acknowledged_by.clone();
            critical.acknowledged_at = earlier.acknowledged_at;
        }
    }
    fresh
}

fn require_reason(reason: &str, operation: &str) -> Result<String> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(AssayError::missing_reason(operation));
    }
    Ok(trimmed.to_string())
}
