use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs_err::tokio as fs;
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};

use super::{ARCHIVE_EXTENSION, ENCRYPTED_EXTENSION, Summary, TaskRunner};
use crate::{
    Error,
    models::{PackageRecord, PackageScope},
    utils::{append_extension, backup_dir_name, progress_label, remove_path},
};

/// What a backup run should produce.
#[derive(Debug, Clone)]
pub struct BackupOptions {
    /// Parent of the timestamped backup directory
    pub backups_location: PathBuf,
    pub scope: PackageScope,
    /// Pack the backup directory into a zip archive
    pub archive: bool,
    /// Encrypt the archive; only honoured together with `archive`
    pub encrypt: bool,
    /// Names the backup directory
    pub started_at: OffsetDateTime,
}

/// Where a backup ended up and how the pulls went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReport {
    /// The backup directory, or the archive that replaced it
    pub artifact: PathBuf,
    pub summary: Summary,
}

impl TaskRunner<'_> {
    /// Pulls every package in `options.scope` into a new timestamped directory.
    #[instrument(skip(self))]
    pub async fn handle_backup(&mut self, options: &BackupOptions) -> Result<BackupReport> {
        let location = &options.backups_location;
        let destination = location.join(backup_dir_name(options.started_at)?);
        if destination.exists() {
            return Err(Error::DestinationAlreadyExists(destination).into());
        }
        fs::create_dir_all(location).await?;
        fs::create_dir(&destination).await?;
        debug!(path = %destination.display(), "Created backup directory");

        self.console.say("Listing installed apk's in device...\n");
        let names = self.session.list_packages(options.scope).await?;
        let mut records = Vec::with_capacity(names.len());
        for name in names {
            let device_path = self.session.resolve_path(&name).await?;
            self.console.say(format_args!("{:40.40} Path: {:60.60}", name.as_str(), device_path));
            records.push(PackageRecord { name, device_path });
        }
        let total = records.len();
        self.console.say(format_args!("\nFound {total} installed packages\n"));

        // Pulls are staged inside the backup directory so nothing next to it is overwritten.
        let mut outcomes = Vec::with_capacity(total);
        for (index, record) in records.iter().enumerate() {
            self.console
                .say(format_args!("{} pulling ... {}", progress_label(index + 1, total), record.name));
            let outcome = self.session.pull(record, &destination).await?;
            if !outcome.is_success() {
                warn!(package = %record.name, "Package left out of the backup");
                self.console.say(format_args!("Failed to pull {}", record.name));
            }
            outcomes.push(outcome);
        }

        let summary = Summary::from_outcomes(&outcomes);
        self.console.say("\n\nSummary: ");
        self.console.say(summary.line("Pulled"));

        let artifact = if options.archive {
            self.archive_backup(&destination, options.encrypt).await?
        } else {
            destination
        };
        info!(artifact = %artifact.display(), ?summary, "Backup finished");
        self.console.say("\nBack up finished");
        Ok(BackupReport { artifact, summary })
    }

    /// Replaces `destination` with a zip archive, then optionally with an encrypted one.
    async fn archive_backup(&mut self, destination: &Path, encrypt: bool) -> Result<PathBuf> {
        let archive = append_extension(destination, ARCHIVE_EXTENSION);
        self.console.say(format_args!("\nCreating zip archive: {}", archive.display()));
        apkvault::pack(destination, &archive)
            .await
            .with_context(|| format!("Failed to create {}", archive.display()))?;
        remove_path(destination).await?;

        if !encrypt {
            return Ok(archive);
        }
        if !self.session.platform().supports_encryption() {
            self.console.say("Encrypted back up isn't supported on Windows");
            return Ok(archive);
        }

        let passphrase = self.console.prompt("Enter password for encryption:")?;
        let encrypted = append_extension(destination, ENCRYPTED_EXTENSION);
        self.console
            .say(format_args!("\nEncrypting archive {} this may take a while...", archive.display()));
        apkvault::encrypt(&passphrase, &archive, &encrypted)
            .await
            .with_context(|| format!("Failed to encrypt {}", archive.display()))?;
        remove_path(&archive).await?;
        Ok(encrypted)
    }
}
