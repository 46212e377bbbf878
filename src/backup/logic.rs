use chrono::Local;
use tracing::{error, info};

use crate::backup::s3_upload::S3Sink;
use crate::backup::{archive, db_dump};
use crate::config::Settings;
use crate::errors::{BackupError, Result};
use crate::target::{self, ConnectionDescriptor};

/// What happened to one target's pipeline run.
#[derive(Debug)]
pub enum TargetOutcome {
    Uploaded { key: String, bytes: u64 },
    Failed { error: String },
}

/// Per-target report collected into the run summary. The identifying fields
/// are `None` when the target failed before its URI could be parsed.
#[derive(Debug)]
pub struct TargetReport {
    pub target: String,
    pub dialect: Option<String>,
    pub database: Option<String>,
    pub host: Option<String>,
    pub outcome: TargetOutcome,
}

impl TargetReport {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, TargetOutcome::Uploaded { .. })
    }
}

/// Result of one orchestrator pass over every configured target.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<TargetReport>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.reports.iter().filter(|r| r.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.reports.len() - self.succeeded()
    }
}

/// Runs the backup pipeline for every configured target, one at a time, in
/// configured order. A failure in one target is recorded in its report and
/// never stops the loop.
pub async fn run_all(settings: &Settings, sink: &S3Sink) -> RunSummary {
    let targets = &settings.targets;
    if targets.is_empty() {
        info!("No databases configured, nothing to back up");
        return RunSummary::default();
    }

    info!("Starting backup pass over {} target(s)", targets.len());

    let mut summary = RunSummary::default();
    for (index, uri) in targets.iter().enumerate() {
        let progress = format!("[{}/{}]", index + 1, targets.len());
        info!(
            "{progress} Backing up {}",
            target::redact_credentials(uri)
        );

        let report = backup_target(uri, sink).await;
        match &report.outcome {
            TargetOutcome::Uploaded { key, bytes } => {
                info!("{progress} Uploaded {key} ({bytes} bytes)");
            }
            TargetOutcome::Failed { error: reason } => {
                error!(
                    "{progress} Backup of {} failed (dialect={} database={} host={}): {}",
                    target::redact_credentials(&report.target),
                    report.dialect.as_deref().unwrap_or("unknown"),
                    report.database.as_deref().unwrap_or("?"),
                    report.host.as_deref().unwrap_or("?"),
                    reason
                );
            }
        }
        summary.reports.push(report);
    }

    info!(
        "Backup pass finished: {} succeeded, {} failed",
        summary.succeeded(),
        summary.failed()
    );
    summary
}

async fn backup_target(uri: &str, sink: &S3Sink) -> TargetReport {
    let descriptor = match target::parse_target(uri) {
        Ok(descriptor) => descriptor,
        Err(e) => {
            return TargetReport {
                target: uri.to_string(),
                dialect: None,
                database: None,
                host: None,
                outcome: TargetOutcome::Failed {
                    error: e.to_string(),
                },
            };
        }
    };

    let outcome = match run_pipeline(&descriptor, sink).await {
        Ok((key, bytes)) => TargetOutcome::Uploaded { key, bytes },
        Err(e) => TargetOutcome::Failed {
            error: e.to_string(),
        },
    };

    TargetReport {
        target: uri.to_string(),
        dialect: Some(descriptor.dialect.to_string()),
        database: Some(descriptor.database.clone()),
        host: Some(descriptor.host.clone()),
        outcome,
    }
}

/// One target's pipeline: select plan, probe, dump, compress, upload,
/// cleanup. Scratch files are removed after the upload attempt whether it
/// succeeded or not.
async fn run_pipeline(descriptor: &ConnectionDescriptor, sink: &S3Sink) -> Result<(String, u64)> {
    let filename = archive::archive_filename(descriptor, Local::now());
    let paths = archive::scratch_paths(&filename);

    let plan = db_dump::DumpPlan::select(descriptor, &paths.dump)
        .ok_or_else(|| BackupError::UnknownDialect(descriptor.dialect.to_string()))?;

    db_dump::run_version_probe(&plan);

    info!(
        "Dumping {} database {} from {}",
        descriptor.dialect, descriptor.database, descriptor.host
    );

    let uploaded: Result<u64> = async {
        db_dump::run_dump(&plan)?;
        archive::compress_dump(&paths.dump, &paths.archive)?;
        let bytes = archive::read_archive(&paths.archive)?;
        sink.upload(&filename, bytes).await
    }
    .await;

    archive::remove_artifacts(&paths);

    Ok((filename, uploaded?))
}
