use std::path::PathBuf;

/// A local package file queued for installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub local_path: PathBuf,
    pub size_bytes: u64,
}

impl WorkItem {
    /// File name shown in progress lines.
    pub fn display_name(&self) -> String {
        self.local_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.local_path.display().to_string())
    }
}
