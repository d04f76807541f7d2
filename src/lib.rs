// Assay - Diagnostic Report Rendering & Workflow Engine
// Copyright (c) 2026 Assay Contributors
// Licensed under the MIT License

//! # Assay - Diagnostic Report Engine
//!
//! Assay is a template-driven rendering and workflow engine for hospital
//! laboratory and imaging reports. It turns raw result values into
//! structured, clinically interpreted reports and drives each report
//! through a strict, auditable lifecycle from data entry to sign-off,
//! delivery, and post-release amendment.
//!
//! ## Overview
//!
//! The engine provides:
//! - **Rendering**: four template shapes (tabular, qualitative, narrative,
//!   hybrid) sharing one pipeline of range resolution, value
//!   interpretation, and formula evaluation
//! - **Reference ranges**: demographic-aware resolution
//!   (pregnancy > age band > gender > generic) with a global critical-value
//!   fallback table
//! - **Formulas**: a hard allow-listed expression grammar plus dedicated
//!   clinical formulas (CKD-EPI 2021 eGFR, Bazett QTc)
//! - **Workflow**: a table-driven state machine with locking, additive
//!   amendments, critical-value notification, and append-only audit
//!
//! ## Architecture
//!
//! The crate follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (rendering, workflow)
//! - [`adapters`] - Collaborator traits and reference implementations
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use assay::adapters::memory::{
//!     InMemoryAuditSink, InMemoryPatientDirectory, InMemoryReportStore,
//!     InMemoryTemplateStore, RecordingNotificationSink,
//! };
//! use assay::core::workflow::{CreateReportInput, ReportEngine};
//! use assay::domain::{ActorId, OrderId, PatientId};
//! use std::sync::Arc;
//!
//! # async fn example() -> assay::domain::Result<()> {
//! let engine = ReportEngine::new(
//!     Arc::new(InMemoryTemplateStore::new()),
//!     Arc::new(InMemoryReportStore::new()),
//!     Arc::new(InMemoryPatientDirectory::new()),
//!     Arc::new(RecordingNotificationSink::new()),
//!     Arc::new(InMemoryAuditSink::new()),
//! )?;
//!
//! let actor = ActorId::new("tech-17").map_err(assay::domain::AssayError::Configuration)?;
//! let report = engine
//!     .create_report(
//!         CreateReportInput {
//!             template: "CBC".to_string(),
//!             tenant: None,
//!             patient_id: PatientId::new("PT-0042")
//!                 .map_err(assay::domain::AssayError::Configuration)?,
//!             order_id: OrderId::new("ORD-9")
//!                 .map_err(assay::domain::AssayError::Configuration)?,
//!             results: Default::default(),
//!         },
//!         &actor,
//!     )
//!     .await?;
//!
//! println!("Created report {}", report.report_number);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::Result`] with
//! [`domain::AssayError`]:
//!
//! - validation failures carry a structured field-level list
//! - invalid transitions name both the current and requested status
//! - formula failures are recovered locally and never abort a render
//! - a failed audit write fails the operation; a failed notification never
//!   does
//!
//! ## Logging
//!
//! Structured logging uses the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(report_number = "HEM2608070001", "Report created");
//! warn!(field_code = "egfr", "Formula evaluation failed");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
