//! Kolosal Drift - Main Entry Point
//!
//! Baseline, drift check and data quality commands.

use clap::Parser;
use kolosal_drift::cli::{cmd_baseline, cmd_check, cmd_quality, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kolosal_drift=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Baseline { data, dataset_version, features, output } => {
            cmd_baseline(&data, &dataset_version, features, &output)?;
        }
        Commands::Check { data, baseline, config, threshold, output, metrics_out } => {
            cmd_check(
                &data,
                &baseline,
                config.as_deref(),
                threshold,
                output.as_deref(),
                metrics_out.as_deref(),
            )?;
        }
        Commands::Quality { data, expected_columns } => {
            cmd_quality(&data, expected_columns)?;
        }
    }

    Ok(())
}
