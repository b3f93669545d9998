use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs_err as fs;
use tracing::{debug, info, instrument, warn};

use crate::models::Settings;

const SETTINGS_FILE: &str = "settings.json";

/// Reads and writes `settings.json` in the application directory.
#[derive(Debug, Clone)]
pub struct SettingsHandler {
    settings_file_path: PathBuf,
}

impl SettingsHandler {
    pub fn new(app_dir: &Path) -> Self {
        Self { settings_file_path: app_dir.join(SETTINGS_FILE) }
    }

    pub fn path(&self) -> &Path {
        &self.settings_file_path
    }

    /// Settings from file, falling back to defaults when the file is unusable.
    pub fn load_or_default(&self) -> Settings {
        self.load_settings().unwrap_or_else(|e| {
            warn!(error = e.as_ref() as &dyn std::error::Error, "Failed to load settings, using defaults");
            Settings::default()
        })
    }

    /// Load settings from file or return defaults if file doesn't exist
    #[instrument(skip(self))]
    pub fn load_settings(&self) -> Result<Settings> {
        if !self.settings_file_path.exists() {
            info!(path = %self.settings_file_path.display(), "Settings file doesn't exist, using defaults");
            return Ok(Settings::default());
        }

        info!(path = %self.settings_file_path.display(), "Loading settings from file");
        let file_content =
            fs::read_to_string(&self.settings_file_path).context("Failed to read settings file")?;
        let settings: Settings =
            serde_json::from_str(&file_content).context("Failed to parse settings file")?;

        debug!(?settings, "Loaded application settings successfully");
        Ok(settings)
    }

    #[instrument(skip(self, settings))]
    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        info!(path = %self.settings_file_path.display(), "Saving settings to file");
        let settings_json =
            serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;

        if let Some(parent) = self.settings_file_path.parent()
            && !parent.exists()
        {
            info!(path = %parent.display(), "Creating settings directory");
            fs::create_dir_all(parent).context("Failed to create settings directory")?;
        }
        fs::write(&self.settings_file_path, settings_json)
            .context("Failed to write settings file")?;
        Ok(())
    }
}
