use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use super::{ARCHIVE_EXTENSION, ENCRYPTED_EXTENSION, Summary, TaskRunner};
use crate::{
    Error,
    utils::{
        append_extension, list_apks, normalize_file_names, progress_label, remove_path,
        single_subdirectory, to_megabytes,
    },
};

impl TaskRunner<'_> {
    /// Installs every package found at `source`: a folder, a `.zip` archive or
    /// an encrypted `.enc` archive.
    ///
    /// Returns `None` when the source cannot be restored on this platform.
    /// Whatever was unpacked or decrypted along the way is removed before
    /// returning, whether the restore succeeded or not.
    #[instrument(skip(self))]
    pub async fn handle_restore(&mut self, source: &Path) -> Result<Option<Summary>> {
        let mut cleanup = Vec::new();
        let result = self.restore_from(source, &mut cleanup).await;
        for path in cleanup.iter().rev() {
            if let Err(e) = remove_path(path).await {
                warn!(path = %path.display(), error = format!("{e:#}"), "Failed to clean up");
            }
        }
        let summary = result?;
        if summary.is_some() {
            self.console.say("\nRestore  finished");
        }
        Ok(summary)
    }

    async fn restore_from(
        &mut self,
        source: &Path,
        cleanup: &mut Vec<PathBuf>,
    ) -> Result<Option<Summary>> {
        let Some(apk_dir) = self.resolve_source(source, cleanup).await? else {
            return Ok(None);
        };
        self.install_dir(&apk_dir).await.map(Some)
    }

    /// Turns `source` into a directory of package files, recording every
    /// intermediate it creates in `cleanup`.
    async fn resolve_source(
        &mut self,
        source: &Path,
        cleanup: &mut Vec<PathBuf>,
    ) -> Result<Option<PathBuf>> {
        if !source.exists() {
            return Err(Error::SourceNotFound(source.to_path_buf()).into());
        }
        if source.is_dir() {
            self.console.say(format_args!("\nRestoring back up from folder: {}", source.display()));
            return Ok(Some(source.to_path_buf()));
        }

        let extension = source.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
        let archive = match extension.as_deref() {
            Some(ARCHIVE_EXTENSION) => {
                self.console.say(format_args!("\nRestoring back up from zip file: {}", source.display()));
                source.to_path_buf()
            }
            Some(ENCRYPTED_EXTENSION) => {
                if !self.session.platform().supports_encryption() {
                    self.console.say("Encrypted restore isn't supported on Windows");
                    return Ok(None);
                }
                self.console.say(format_args!(
                    "\nRestoring back up from encrypted archive: {}",
                    source.display()
                ));
                let decrypted = append_extension(&source.with_extension(""), ARCHIVE_EXTENSION);
                ensure_absent(&decrypted)?;
                let passphrase = self.console.prompt("Enter password for decryption:")?;
                self.console
                    .say(format_args!("\nDecrypting back up {} this may take a while...", source.display()));
                cleanup.push(decrypted.clone());
                apkvault::decrypt(&passphrase, source, &decrypted)
                    .await
                    .with_context(|| format!("Failed to decrypt {}", source.display()))?;
                decrypted
            }
            _ => return Err(Error::UnsupportedSource(source.to_path_buf()).into()),
        };

        let staging = archive.with_extension("");
        ensure_absent(&staging)?;
        self.console.say(format_args!("\nUnzipping {} ...", archive.display()));
        cleanup.push(staging.clone());
        apkvault::unpack(&archive, &staging)
            .await
            .with_context(|| format!("Failed to unpack {}", archive.display()))?;

        // Archives made from a folder may hold that folder rather than its files.
        Ok(Some(single_subdirectory(&staging).await?.unwrap_or(staging)))
    }

    async fn install_dir(&mut self, dir: &Path) -> Result<Summary> {
        let renamed = normalize_file_names(dir).await?;
        if renamed > 0 {
            info!(renamed, "Replaced spaces in package file names");
        }
        let items = list_apks(dir).await?;
        let total_bytes: u64 = items.iter().map(|item| item.size_bytes).sum();
        self.console
            .say(format_args!("\nTotal Installation Size: {:.2} MB", to_megabytes(total_bytes)));
        self.console.say("-".repeat(10));

        let total = items.len();
        let mut outcomes = Vec::with_capacity(total);
        for (index, item) in items.iter().enumerate() {
            self.console
                .say(format_args!("{} Installing {}", progress_label(index + 1, total), item.display_name()));
            outcomes.push(self.session.install(&item.local_path).await?);
        }

        let summary = Summary::from_outcomes(&outcomes);
        info!(?summary, "Restore finished");
        self.console.say("\n\nSummary: ");
        self.console.say(summary.line("Installed"));
        Ok(summary)
    }
}

fn ensure_absent(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(Error::DestinationAlreadyExists(path.to_path_buf()).into());
    }
    Ok(())
}
