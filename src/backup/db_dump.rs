use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, warn};
use which::which;

use crate::errors::{BackupError, Result};
use crate::target::{ConnectionDescriptor, Dialect};

const MYSQL_DEFAULT_PORT: u16 = 3306;

/// One subprocess invocation as an explicit program plus argument list.
/// Nothing here ever goes through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    fn new(program: &str, args: Vec<String>) -> Self {
        CommandSpec {
            program: program.to_string(),
            args,
        }
    }
}

/// How to dump one database: the dump invocation itself plus a best-effort
/// client version probe.
#[derive(Debug, Clone)]
pub struct DumpPlan {
    pub dump: CommandSpec,
    pub version_probe: CommandSpec,
}

impl DumpPlan {
    /// Selects the dump tool for the descriptor's dialect. Every supported
    /// dialect maps to exactly one plan; `Unknown` maps to none and the
    /// caller skips the target.
    pub fn select(descriptor: &ConnectionDescriptor, dump_path: &Path) -> Option<DumpPlan> {
        let dump_path = dump_path.to_string_lossy().into_owned();

        match descriptor.dialect {
            Dialect::Postgresql => Some(DumpPlan {
                dump: CommandSpec::new(
                    "pg_dump",
                    vec![
                        "--format=custom".to_string(),
                        format!("--file={dump_path}"),
                        descriptor.uri.clone(),
                    ],
                ),
                version_probe: CommandSpec::new("psql", vec!["--version".to_string()]),
            }),
            Dialect::Mongodb => Some(DumpPlan {
                dump: CommandSpec::new(
                    "mongodump",
                    vec![
                        format!("--uri={}", descriptor.uri),
                        format!("--archive={dump_path}"),
                    ],
                ),
                version_probe: CommandSpec::new("mongodump", vec!["--version".to_string()]),
            }),
            Dialect::Mysql => {
                let port = descriptor.port.unwrap_or(MYSQL_DEFAULT_PORT);
                Some(DumpPlan {
                    dump: CommandSpec::new(
                        "mysqldump",
                        vec![
                            format!("--host={}", descriptor.host),
                            format!("--port={port}"),
                            format!("--user={}", descriptor.username),
                            format!("--password={}", descriptor.password),
                            format!("--result-file={dump_path}"),
                            descriptor.database.clone(),
                        ],
                    ),
                    version_probe: CommandSpec::new("mysql", vec!["--version".to_string()]),
                })
            }
            Dialect::Unknown => None,
        }
    }
}

/// Best-effort client version probe. Failure is logged and never aborts the
/// target's run.
pub fn run_version_probe(plan: &DumpPlan) {
    let probe = &plan.version_probe;
    match Command::new(&probe.program).args(&probe.args).output() {
        Ok(output) if output.status.success() => {
            info!("{}", String::from_utf8_lossy(&output.stdout).trim());
        }
        Ok(output) => {
            warn!(
                "Version probe {} exited with {}",
                probe.program, output.status
            );
        }
        Err(e) => {
            warn!("Version probe {} failed to start: {}", probe.program, e);
        }
    }
}

/// Runs the dump command to completion, capturing stderr for the error path.
pub fn run_dump(plan: &DumpPlan) -> Result<()> {
    let program = find_dump_executable(&plan.dump.program)?;

    let output = Command::new(&program).args(&plan.dump.args).output()?;
    if !output.status.success() {
        return Err(BackupError::ExternalTool {
            tool: plan.dump.program.clone(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}

fn find_dump_executable(name: &str) -> Result<PathBuf> {
    which(name).map_err(|_| BackupError::ToolNotFound(name.to_string()))
}
