//! cfgsweep: deletes stale, unreferenced ConfigMaps and Secrets.

#![forbid(unsafe_code)]

mod cli;
mod report_output;

use std::process::ExitCode;
use std::sync::Arc;

use cfgsweep_application::SweepService;
use cfgsweep_core::{AppError, AppResult};
use cfgsweep_infrastructure::{KubeCluster, connect};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

const EXIT_RUN_FAILED: u8 = 1;
const EXIT_CONFIGURATION: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_level());

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(error = %error, "cfgsweep failed");
            ExitCode::from(exit_status(&error))
        }
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    let settings = cli.sweep_settings()?;
    let client = connect(&cli.connect_options()).await?;
    let cluster = Arc::new(KubeCluster::new(client, cli.page_size));
    let service = SweepService::new(cluster.clone(), cluster, settings)?;

    let settings = service.settings();
    info!(
        namespace = %settings.namespace,
        retention_seconds = settings.retention.period().num_seconds(),
        dry_run = settings.dry_run,
        kinds = ?settings.enabled_kinds,
        max_concurrent_deletes = settings.max_concurrent_deletes,
        "cfgsweep started"
    );

    let report = service.run().await?;
    println!("{}", report_output::render(&report, cli.output)?);

    Ok(())
}

fn exit_status(error: &AppError) -> u8 {
    if error.is_configuration() {
        EXIT_CONFIGURATION
    } else {
        EXIT_RUN_FAILED
    }
}

fn init_tracing(default_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
