use std::path::PathBuf;

/// Failures that end the run.
///
/// These are raised as the root cause of an `anyhow::Error` and recovered with
/// `downcast_ref` where a caller needs to tell them apart. Per-package transfer
/// and install failures are not errors; they are recorded as
/// [`Outcome::Failed`](crate::models::Outcome::Failed).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unsupported OS: {0}")]
    UnsupportedPlatform(String),

    #[error("No device attached after {attempts} attempts")]
    DeviceNotAttached { attempts: u32 },

    #[error("Exit code {status}, an error occurred running `adb {command}`\n{output}")]
    BridgeCommandFailed { command: String, status: i32, output: String },

    #[error("Failed to parse device path of package '{package}': {output:?}")]
    PathParse { package: String, output: String },

    #[error("isn't a dir {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("{} already exists", .0.display())]
    DestinationAlreadyExists(PathBuf),

    #[error("File or folder doesn't exist: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Can't restore from {}: expected a folder, a .zip or an .enc archive", .0.display())]
    UnsupportedSource(PathBuf),

    #[error("adb executable not found (tried {tried})")]
    BridgeNotFound { tried: String },
}
