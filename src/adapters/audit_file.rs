//! File-backed audit sink
//!
//! Appends audit entries as JSON lines to a local file. Entries are written
//! append-only and flushed per write; the file is never rewritten.

use crate::adapters::traits::AuditSink;
use crate::domain::audit::AuditLogEntry;
use crate::domain::errors::AssayError;
use crate::domain::Result;
use async_trait::async_trait;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Audit sink writing JSONL to a local file
pub struct JsonlAuditSink {
    log_path: PathBuf,
}

impl JsonlAuditSink {
    /// Creates the sink, ensuring the parent directory exists
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created.
    pub fn new(log_path: PathBuf) -> Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AssayError::AuditWrite(format!(
                    "Failed to create audit log directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        Ok(Self { log_path })
    }

    fn write_entry(&self, entry: &AuditLogEntry) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| {
                AssayError::AuditWrite(format!(
                    "Failed to open audit log {}: {e}",
                    self.log_path.display()
                ))
            })?;

        let line = serde_json::to_string(entry)
            .map_err(|e| AssayError::AuditWrite(format!("Failed to serialize audit entry: {e}")))?;
        writeln!(file, "{line}")
            .map_err(|e| AssayError::AuditWrite(format!("Failed to write audit entry: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl AuditSink for JsonlAuditSink {
    async fn append(&self, entry: &AuditLogEntry) -> Result<()> {
        self.write_entry(entry)
    }
}
