use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, instrument, warn};

use super::Session;
use crate::models::{Outcome, PackageRecord};

/// Generic name a package binary lands under before it is renamed.
pub const STAGING_FILE: &str = "base.apk";

impl Session {
    /// Copies `record`'s binary off the device into `work_dir/<name>.apk`.
    ///
    /// POSIX hosts stream the file through `adb exec-out cat`; Windows uses
    /// `adb pull`. A failed invocation or a missing staging file afterwards is
    /// reported as [`Outcome::Failed`] and leaves nothing behind.
    #[instrument(level = "debug", skip(self, work_dir), fields(package = %record.name), err)]
    pub async fn pull(&self, record: &PackageRecord, work_dir: &Path) -> Result<Outcome> {
        let staging = work_dir.join(STAGING_FILE);
        let result = if self.platform().streams_pulls() {
            self.bridge
                .exec_to_file(&["exec-out", "cat", record.device_path.as_str()], &staging)
                .await?
        } else {
            let staging_arg = staging.to_string_lossy();
            self.bridge.exec(&["pull", record.device_path.as_str(), staging_arg.as_ref()]).await?
        };

        if !result.success() {
            warn!(status = result.status, output = result.output, "Pull failed");
            if staging.exists()
                && let Err(e) = fs_err::tokio::remove_file(&staging).await
            {
                warn!(error = &e as &dyn std::error::Error, "Failed to remove partial pull");
            }
            return Ok(Outcome::Failed);
        }
        if !staging.is_file() {
            warn!(staging = %staging.display(), "adb reported success but no file was pulled");
            return Ok(Outcome::Failed);
        }

        let local = work_dir.join(record.name.apk_file_name());
        fs_err::tokio::rename(&staging, &local)
            .await
            .with_context(|| format!("Failed to rename pulled file for {}", record.name))?;
        debug!(local = %local.display(), "Pulled package");
        Ok(Outcome::Success)
    }
}
