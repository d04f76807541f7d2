//! In-memory reference adapters
//!
//! Process-local implementations of the collaborator traits, used by the
//! CLI and by tests. They honor the same contracts the production adapters
//! must: unique active template codes per scope, revision-checked report
//! updates, per-category/day sequences, and append-only audit.

use crate::adapters::traits::{
    AuditSink, NotificationSink, PatientDirectory, ReportStore, TemplateStore,
};
use crate::domain::audit::AuditLogEntry;
use crate::domain::errors::AssayError;
use crate::domain::ids::{PatientId, ReportId, TemplateCode, TemplateId, TenantId};
use crate::domain::patient::PatientContext;
use crate::domain::report::{CriticalValue, Report};
use crate::domain::template::Template;
use crate::domain::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// In-memory template store
#[derive(Default)]
pub struct InMemoryTemplateStore {
    templates: RwLock<Vec<Template>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a template, panicking on contract violations; test/CLI helper
    pub async fn seed(&self, template: Template) {
        self.save(&template).await.expect("seed template");
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn find_by_id(&self, id: &TemplateId) -> Result<Option<Template>> {
        let templates = self.templates.read().await;
        Ok(templates.iter().find(|t| &t.id == id).cloned())
    }

    async fn find_active_by_code(
        &self,
        code: &TemplateCode,
        tenant: Option<&TenantId>,
    ) -> Result<Option<Template>> {
        let templates = self.templates.read().await;
        Ok(templates
            .iter()
            .find(|t| t.active && &t.code == code && t.tenant.as_ref() == tenant)
            .cloned())
    }

    async fn save(&self, template: &Template) -> Result<()> {
        let mut templates = self.templates.write().await;

        if template.active {
            let duplicate = templates.iter().any(|t| {
                t.active
                    && t.id != template.id
                    && t.code == template.code
                    && t.tenant == template.tenant
            });
            if duplicate {
                return Err(AssayError::Configuration(format!(
                    "active template with code '{}' already exists in this scope",
                    template.code
                )));
            }
        }

        if let Some(existing) = templates.iter_mut().find(|t| t.id == template.id) {
            *existing = template.clone();
        } else {
            templates.push(template.clone());
        }
        Ok(())
    }
}

/// In-memory report store with revision-checked updates
#[derive(Default)]
pub struct InMemoryReportStore {
    reports: RwLock<HashMap<ReportId, Report>>,
    sequences: RwLock<HashMap<(String, NaiveDate), u32>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn insert(&self, report: &Report) -> Result<()> {
        let mut reports = self.reports.write().await;
        if reports.contains_key(&report.id) {
            return Err(AssayError::Conflict(report.id.to_string()));
        }
        reports.insert(report.id, report.clone());
        Ok(())
    }

    async fn load(&self, id: &ReportId) -> Result<Option<Report>> {
        let reports = self.reports.read().await;
        Ok(reports.get(id).cloned())
    }

    async fn update(&self, report: &Report, expected_revision: u64) -> Result<()> {
        let mut reports = self.reports.write().await;
        let existing = reports
            .get(&report.id)
            .ok_or_else(|| AssayError::ReportNotFound(report.id.to_string()))?;

        if existing.revision != expected_revision {
            return Err(AssayError::Conflict(report.id.to_string()));
        }

        reports.insert(report.id, report.clone());
        Ok(())
    }

    async fn next_sequence(&self, category_prefix: &str, date: NaiveDate) -> Result<u32> {
        let mut sequences = self.sequences.write().await;
        let counter = sequences
            .entry((category_prefix.to_string(), date))
            .or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}

/// In-memory patient registry
#[derive(Default)]
pub struct InMemoryPatientDirectory {
    patients: RwLock<HashMap<PatientId, (PatientContext, Option<String>)>>,
}

impl InMemoryPatientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a patient with an optional critical-value contact
    pub async fn register(
        &self,
        id: PatientId,
        context: PatientContext,
        critical_contact: Option<String>,
    ) {
        let mut patients = self.patients.write().await;
        patients.insert(id, (context, critical_contact));
    }
}

#[async_trait]
impl PatientDirectory for InMemoryPatientDirectory {
    async fn patient_context(&self, id: &PatientId) -> Result<Option<PatientContext>> {
        let patients = self.patients.read().await;
        Ok(patients.get(id).map(|(context, _)| context.clone()))
    }

    async fn critical_contact(&self, id: &PatientId) -> Result<Option<String>> {
        let patients = self.patients.read().await;
        Ok(patients.get(id).and_then(|(_, contact)| contact.clone()))
    }
}

/// Recording notification sink
///
/// Captures every delivery attempt; can be switched into failure mode to
/// exercise the engine's tolerance of notification outages.
#[derive(Default)]
pub struct RecordingNotificationSink {
    sent: RwLock<Vec<SentNotification>>,
    failing: AtomicBool,
}

/// A captured notification
#[derive(Debug, Clone, PartialEq)]
pub struct SentNotification {
    pub recipient: String,
    pub report_number: String,
    pub critical_count: usize,
}

impl RecordingNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent deliveries fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Notifications captured so far
    pub async fn sent(&self) -> Vec<SentNotification> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotificationSink {
    async fn notify_critical(
        &self,
        recipient: &str,
        report_number: &str,
        critical_values: &[CriticalValue],
    ) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AssayError::NotificationDelivery(
                "notification sink unavailable".to_string(),
            ));
        }
        let mut sent = self.sent.write().await;
        sent.push(SentNotification {
            recipient: recipient.to_string(),
            report_number: report_number.to_string(),
            critical_count: critical_values.len(),
        });
        Ok(())
    }
}

/// In-memory append-only audit sink
#[derive(Default)]
pub struct InMemoryAuditSink {
    entries: RwLock<Vec<AuditLogEntry>>,
    failing: AtomicBool,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent appends fail, to exercise the fatal audit path
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Entries appended so far
    pub async fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn append(&self, entry: &AuditLogEntry) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AssayError::AuditWrite("audit sink unavailable".to_string()));
        }
        let mut entries = self.entries.write().await;
        entries.push(entry.clone());
        Ok(())
    }
}
