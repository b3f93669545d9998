use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::PackageScope;

/// Contents of `settings.json`. Missing keys take their default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    /// adb executable; empty means resolve from the platform
    pub adb_path: String,
    /// Directory new backups are created in; empty means the working directory
    pub backups_location: String,
    pub package_scope: PackageScope,
}

impl Settings {
    pub fn adb_path(&self) -> Option<PathBuf> {
        if self.adb_path.is_empty() { None } else { Some(PathBuf::from(&self.adb_path)) }
    }

    pub fn backups_location(&self) -> PathBuf {
        if self.backups_location.is_empty() {
            PathBuf::from(".")
        } else {
            PathBuf::from(&self.backups_location)
        }
    }
}
