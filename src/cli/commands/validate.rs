//! Validate command implementation
//!
//! Validates a result set against a template's field definitions and prints
//! a field-level error list.

use super::{load_input, load_template};
use crate::core::workflow::validate::validate_results;
use clap::Args;

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Template definition JSON file
    #[arg(short, long)]
    pub template: String,

    /// Render input JSON file (patient context + results)
    #[arg(short, long)]
    pub input: String,
}

impl ValidateArgs {
    /// Execute the validate command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(template = %self.template, input = %self.input, "Validating results");

        let template = load_template(&self.template)?;
        let input = load_input(&self.input)?;

        let outcome = validate_results(&template, &input.results);

        if outcome.valid {
            println!("✅ Result set is valid for template {}", template.code);
        } else {
            println!("❌ Result set failed validation:");
            for error in &outcome.errors {
                println!("   {} [{}]: {}", error.field_code, error.kind, error.message);
            }
        }
        for warning in &outcome.warnings {
            println!("⚠️  {warning}");
        }

        Ok(if outcome.valid { 0 } else { 1 })
    }
}
