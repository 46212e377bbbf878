use std::str::FromStr;

use chrono::Local;
use cron::Schedule;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::backup::{self, S3Sink};
use crate::config::Settings;
use crate::errors::{BackupError, Result};

/// Parses a standard five-field cron expression (minute, hour, day-of-month,
/// month, day-of-week). The `cron` crate wants a leading seconds field, so
/// the expression is pinned to second zero before parsing.
pub fn parse_schedule(expr: &str) -> Result<Schedule> {
    let expr = expr.trim();
    let fields = expr.split_whitespace().count();
    if fields != 5 {
        return Err(BackupError::Config(format!(
            "CRON expression must have 5 fields (minute hour day-of-month month day-of-week), got {fields}: '{expr}'"
        )));
    }

    Schedule::from_str(&format!("0 {expr}"))
        .map_err(|e| BackupError::Config(format!("Invalid CRON expression '{expr}': {e}")))
}

/// Runs a backup pass at every schedule fire time, forever.
///
/// Each pass is awaited to completion before the next fire time is computed,
/// so two passes can never overlap; fire times that fall due while a pass is
/// still running are skipped.
pub async fn run_scheduled(settings: &Settings, sink: &S3Sink, schedule: &Schedule) {
    loop {
        let Some(next) = schedule.upcoming(Local).next() else {
            warn!("Schedule has no upcoming fire times, stopping scheduler");
            return;
        };

        info!(
            "Next scheduled backup at {}",
            next.format("%Y-%m-%d %H:%M:%S")
        );
        if let Ok(wait) = (next - Local::now()).to_std() {
            sleep(wait).await;
        }

        backup::run_all(settings, sink).await;
    }
}
