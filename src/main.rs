// Assay - Diagnostic Report Rendering & Workflow Engine
// Copyright (c) 2026 Assay Contributors
// Licensed under the MIT License

use assay::cli::{Cli, Commands};
use assay::config::LoggingConfig;
use assay::logging::init_logging;
use clap::Parser;
use std::process;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    // This is optional - if .env doesn't exist, it's silently ignored
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Console-only logging for the CLI; file logging is for embedded use
    let log_level = cli.log_level.as_deref().unwrap_or("info");
    let logging_config = LoggingConfig {
        local_enabled: false,
        local_path: String::new(),
        local_rotation: "daily".to_string(),
    };
    let _guard = match init_logging(log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Assay - diagnostic report engine"
    );

    let result = match &cli.command {
        Commands::Render(args) => args.execute().await,
        Commands::Validate(args) => args.execute().await,
        Commands::CheckCritical(args) => args.execute().await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("❌ {e}");
            process::exit(1);
        }
    }
}
