//! Command implementations

pub mod check;
pub mod init;
pub mod render;
pub mod validate;
pub mod validate_config;

use crate::core::render::RenderInput;
use crate::domain::template::Template;
use anyhow::{Context, Result};
use std::path::Path;

/// Loads a template definition from a JSON file
pub(crate) fn load_template(path: &str) -> Result<Template> {
    let contents = std::fs::read_to_string(Path::new(path))
        .with_context(|| format!("Failed to read template file: {path}"))?;
    let template: Template = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse template JSON: {path}"))?;
    template
        .check_invariants()
        .map_err(|problems| anyhow::anyhow!("Invalid template: {}", problems.join("; ")))?;
    Ok(template)
}

/// Loads a render input (patient context + results) from a JSON file
pub(crate) fn load_input(path: &str) -> Result<RenderInput> {
    let contents = std::fs::read_to_string(Path::new(path))
        .with_context(|| format!("Failed to read input file: {path}"))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse input JSON: {path}"))
}
