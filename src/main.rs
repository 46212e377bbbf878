//! Scheduled Database Backup Tool
//!
//! Dumps each configured database with its native client tool, compresses
//! the dump into a tar.gz archive and uploads it to S3-compatible storage.

// dbbackup/src/main.rs
mod backup;
mod config;
mod errors;
mod scheduler;
mod target;

use anyhow::{Context, Result};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use backup::S3Sink;
use config::Settings;

#[tokio::main]
async fn main() -> ExitCode {
    match run_app().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings =
        Settings::from_env().context("Failed to load configuration from environment")?;

    // A bad schedule expression should stop startup, not the first tick.
    let schedule = settings
        .cron
        .as_deref()
        .map(scheduler::parse_schedule)
        .transpose()
        .context("Failed to parse CRON schedule")?;

    let sink = S3Sink::new(&settings).await;

    if settings.run_on_startup {
        info!("RUN_ON_STARTUP is set, starting backup pass now");
        backup::run_all(&settings, &sink).await;
    }

    match schedule {
        Some(schedule) => scheduler::run_scheduled(&settings, &sink, &schedule).await,
        None => {
            if !settings.run_on_startup {
                warn!("Neither RUN_ON_STARTUP nor CRON is configured, no backups will run");
            }
        }
    }

    Ok(())
}
