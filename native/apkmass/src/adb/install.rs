use std::path::Path;

use anyhow::Result;
use tracing::{info, instrument, warn};

use super::Session;
use crate::models::Outcome;

/// Text adb prints when an install went through.
pub const INSTALL_SUCCESS_MARKER: &str = "Success";

/// Classifies captured `adb install` output.
pub fn classify_install(output: &str) -> Outcome {
    if output.contains(INSTALL_SUCCESS_MARKER) { Outcome::Success } else { Outcome::Failed }
}

impl Session {
    /// Installs `local_path`, allowing downgrades and replacing an existing install.
    ///
    /// adb exits nonzero when an install fails; that is a per-package
    /// [`Outcome::Failed`], not an error.
    #[instrument(level = "debug", skip(self), err)]
    pub async fn install(&self, local_path: &Path) -> Result<Outcome> {
        let path = local_path.to_string_lossy();
        let output = self.bridge.run(&["install", "-d", "-r", path.as_ref()], true).await?;
        let outcome = classify_install(&output);
        match outcome {
            Outcome::Success => info!("Installed"),
            _ => warn!(output, "Install failed"),
        }
        Ok(outcome)
    }
}
