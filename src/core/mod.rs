//! Core business logic for the report engine.
//!
//! This module contains the rendering pipeline and the workflow state
//! machine.
//!
//! # Modules
//!
//! - [`render`] - Template rendering: range resolution, value
//!   interpretation, formula evaluation, per-shape renderers
//! - [`workflow`] - Report lifecycle: transition table, operations,
//!   validation, report numbering
//!
//! # Report Lifecycle
//!
//! The typical path of a report:
//!
//! 1. **Create**: resolve the template, render the initial result set,
//!    persist in `DRAFT` with a sequential report number
//! 2. **Enter**: technicians merge raw values; each update re-renders
//! 3. **QC**: full validation gates the move to quality control
//! 4. **Review & sign-off**: specialist approval locks the report
//! 5. **Deliver**: the released report stays locked
//! 6. **Amend**: post-sign-off corrections append to the amendment log and
//!    never overwrite history
//!
//! # Example
//!
//! ```rust,no_run
//! use assay::adapters::memory::{
//!     InMemoryAuditSink, InMemoryPatientDirectory, InMemoryReportStore,
//!     InMemoryTemplateStore, RecordingNotificationSink,
//! };
//! use assay::core::workflow::ReportEngine;
//! use std::sync::Arc;
//!
//! # fn example() -> assay::domain::Result<()> {
//! let engine = ReportEngine::new(
//!     Arc::new(InMemoryTemplateStore::new()),
//!     Arc::new(InMemoryReportStore::new()),
//!     Arc::new(InMemoryPatientDirectory::new()),
//!     Arc::new(RecordingNotificationSink::new()),
//!     Arc::new(InMemoryAuditSink::new()),
//! )?;
//! # let _ = engine;
//! # Ok(())
//! # }
//! ```

pub mod render;
pub mod workflow;
