//! CLI interface and argument parsing
//!
//! This module provides the command-line interface using clap. The
//! commands operate on JSON template and result files, exercising the
//! rendering engine without any persistence collaborator.

pub mod commands;

use clap::{Parser, Subcommand};

/// Assay - diagnostic report rendering engine
#[derive(Parser, Debug)]
#[command(name = "assay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "assay.toml", env = "ASSAY_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "ASSAY_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a result set against a template
    Render(commands::render::RenderArgs),

    /// Validate a result set against a template
    Validate(commands::validate::ValidateArgs),

    /// Check a result set for critical values
    CheckCritical(commands::check::CheckCriticalArgs),

    /// Validate the configuration file
    ValidateConfig(commands::validate_config::ValidateConfigArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
