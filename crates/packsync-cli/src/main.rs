//! Packsync - modpack deployment
//!
//! Usage:
//!   packsync <config.toml>

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use packsync_core::config::load_config;
use packsync_core::context::DeployContext;
use packsync_core::deploy::{DeployReport, Pipeline, PipelineOptions};

#[derive(Parser)]
#[command(name = "packsync", version)]
#[command(about = "Deploy a modpack onto a running game server", long_about = None)]
struct Cli {
    /// Path to the deployment configuration file (TOML)
    config: PathBuf,
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "packsync=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if !cli.config.is_file() {
        error!("The file {} does not exist", cli.config.display());
        return ExitCode::FAILURE;
    }

    match run(&cli.config) {
        Ok(report) => {
            log_report(&report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("Deployment failed: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(config_path: &Path) -> Result<DeployReport> {
    let config = load_config(config_path)?;
    let context =
        DeployContext::from_config(&config).context("Failed to initialize deployment")?;

    let pipeline = Pipeline::new(&context, PipelineOptions::from_config(&config));
    Ok(pipeline.run()?)
}

fn log_report(report: &DeployReport) {
    for record in &report.stages {
        let stage = match &record.target {
            Some(target) => format!("{} ({})", record.stage, target),
            None => record.stage.to_string(),
        };
        if record.outcome.is_degraded() {
            warn!("{}: {}", stage, record.outcome);
        } else {
            info!("{}: {}", stage, record.outcome);
        }
    }

    let content = &report.content;
    info!(
        added = content.added,
        replaced = content.replaced,
        removed = content.removed,
        installed = content.installed,
        bytes = content.bytes_downloaded,
        elapsed_secs = report.elapsed().num_seconds(),
        "Deployed {} {}",
        report.pack_name,
        report.pack_version
    );

    let degraded = report.degraded().count();
    if degraded > 0 {
        warn!("{} stage(s) degraded; see the log above", degraded);
    }
}
