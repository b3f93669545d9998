//! One program run: connect, back up, restore, report.

use std::path::PathBuf;

use anyhow::Result;
use time::OffsetDateTime;
use tokio::time::Instant;
use tracing::{info, instrument};

use crate::{
    adb::Session,
    cli::Cli,
    console::Console,
    models::Settings,
    task::{BackupOptions, BackupReport, Summary, TaskRunner},
    utils::format_elapsed,
};

/// What to do in this run, with CLI flags already merged over settings.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub backup: Option<BackupOptions>,
    pub restore: Option<PathBuf>,
}

impl RunOptions {
    pub fn new(cli: &Cli, settings: &Settings, started_at: OffsetDateTime) -> Self {
        let backup = cli.backup.then(|| BackupOptions {
            backups_location: cli.output.clone().unwrap_or_else(|| settings.backups_location()),
            scope: cli.scope.unwrap_or(settings.package_scope),
            archive: cli.archive,
            encrypt: cli.encrypt,
            started_at,
        });
        Self { backup, restore: cli.install.clone() }
    }
}

/// Results of the workflows that ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub backup: Option<BackupReport>,
    /// `None` also when the restore was skipped on this platform
    pub restore: Option<Summary>,
}

/// Connects to the device, then backs up and restores as requested.
///
/// Once connected the elapsed time is printed whatever the outcome. The adb
/// server is left to the caller to stop with [`Session::shutdown`].
#[instrument(skip_all)]
pub async fn drive(
    session: &mut Session,
    options: &RunOptions,
    console: &mut Console,
) -> Result<RunReport> {
    let started = Instant::now();
    session.establish(console).await?;

    let result = run_tasks(session, options, console).await;
    console.say(format_args!("Elapsed time {}", format_elapsed(started.elapsed())));
    if let Ok(report) = &result {
        info!(?report, "Run finished");
    }
    result
}

async fn run_tasks(
    session: &Session,
    options: &RunOptions,
    console: &mut Console,
) -> Result<RunReport> {
    let mut runner = TaskRunner::new(session, console);
    let mut report = RunReport::default();
    if let Some(backup) = &options.backup {
        report.backup = Some(runner.handle_backup(backup).await?);
    }
    if let Some(source) = &options.restore {
        report.restore = runner.handle_restore(source).await?;
    }
    Ok(report)
}
