//! Render command implementation

use super::{load_input, load_template};
use crate::core::render::RenderEngine;
use clap::Args;

/// Arguments for the render command
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Template definition JSON file
    #[arg(short, long)]
    pub template: String,

    /// Render input JSON file (patient context + results)
    #[arg(short, long)]
    pub input: String,

    /// Emit compact JSON instead of pretty-printed
    #[arg(long)]
    pub compact: bool,
}

impl RenderArgs {
    /// Execute the render command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(template = %self.template, input = %self.input, "Rendering report");

        let template = load_template(&self.template)?;
        let input = load_input(&self.input)?;

        let engine = RenderEngine::new()?;
        let rendered = engine.render(&template, &input)?;

        let output = if self.compact {
            serde_json::to_string(&rendered)?
        } else {
            serde_json::to_string_pretty(&rendered)?
        };
        println!("{output}");

        if rendered.has_critical_values() {
            eprintln!(
                "⚠️  {} critical value(s) detected",
                rendered.critical_values.len()
            );
        }

        Ok(0)
    }
}
