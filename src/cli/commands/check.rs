//! Check-critical command implementation
//!
//! Renders a result set and reports detected critical values only.

use super::{load_input, load_template};
use crate::core::render::RenderEngine;
use clap::Args;

/// Arguments for the check-critical command
#[derive(Args, Debug)]
pub struct CheckCriticalArgs {
    /// Template definition JSON file
    #[arg(short, long)]
    pub template: String,

    /// Render input JSON file (patient context + results)
    #[arg(short, long)]
    pub input: String,
}

impl CheckCriticalArgs {
    /// Execute the check-critical command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(template = %self.template, input = %self.input, "Checking critical values");

        let template = load_template(&self.template)?;
        let input = load_input(&self.input)?;

        let engine = RenderEngine::new()?;
        let rendered = engine.render(&template, &input)?;

        if rendered.critical_values.is_empty() {
            println!("✅ No critical values detected");
            return Ok(0);
        }

        println!(
            "🚨 {} critical value(s) detected:",
            rendered.critical_values.len()
        );
        for critical in &rendered.critical_values {
            println!(
                "   {} ({}): {} [{}]",
                critical.field_code, critical.field_label, critical.value, critical.reason
            );
        }

        Ok(1)
    }
}
