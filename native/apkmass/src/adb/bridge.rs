use std::{
    fmt,
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument, trace};

use crate::{Error, platform::Platform};

/// Captured result of one adb invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeOutput {
    /// Exit status; `-1` when the process was terminated by a signal
    pub status: i32,
    /// stdout followed by stderr, trailing newlines removed
    pub output: String,
}

impl BridgeOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Runs adb invocations. Every call completes before it returns; nothing is retried here.
#[async_trait]
pub trait Bridge: Send + Sync + fmt::Debug {
    fn platform(&self) -> Platform;

    /// Runs `adb <args>` and captures its output, whatever the exit status.
    async fn exec(&self, args: &[&str]) -> Result<BridgeOutput>;

    /// Runs `adb <args>` with stdout written to `dest`. Only stderr is captured.
    async fn exec_to_file(&self, args: &[&str], dest: &Path) -> Result<BridgeOutput>;

    /// Runs `adb <args>` and returns its output.
    ///
    /// A nonzero exit status is [`Error::BridgeCommandFailed`] unless
    /// `tolerate_nonzero` is set, in which case the output is returned as is.
    async fn run(&self, args: &[&str], tolerate_nonzero: bool) -> Result<String> {
        let result = self.exec(args).await?;
        if tolerate_nonzero || result.success() {
            return Ok(result.output);
        }
        Err(Error::BridgeCommandFailed {
            command: args.join(" "),
            status: result.status,
            output: result.output,
        }
        .into())
    }
}

/// The real adb executable.
#[derive(Debug, Clone)]
pub struct AdbBridge {
    executable: PathBuf,
    platform: Platform,
}

impl AdbBridge {
    pub fn new(executable: PathBuf, platform: Platform) -> Self {
        Self { executable, platform }
    }

    /// Finds the adb executable: `explicit` if given, otherwise the build bundled
    /// for `platform`, otherwise `adb` on `PATH`.
    #[instrument(level = "debug", ret, err)]
    pub fn resolve(platform: Platform, explicit: Option<PathBuf>) -> Result<Self> {
        let executable = match explicit {
            Some(path) => resolve_binary_path(&path)
                .with_context(|| format!("Configured adb path is not usable: {}", path.display()))?,
            None => {
                let bundled = Path::new(platform.bundled_adb());
                match resolve_binary_path(bundled) {
                    Ok(path) => path,
                    Err(_) => which::which("adb").map_err(|_| Error::BridgeNotFound {
                        tried: format!("{}, adb on PATH", bundled.display()),
                    })?,
                }
            }
        };
        debug!(path = %executable.display(), "Resolved adb executable");
        Ok(Self::new(executable, platform))
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(&self.executable);
        command.args(args).stdin(Stdio::null()).kill_on_drop(true);
        command
    }
}

#[async_trait]
impl Bridge for AdbBridge {
    fn platform(&self) -> Platform {
        self.platform
    }

    #[instrument(level = "debug", skip(self), err)]
    async fn exec(&self, args: &[&str]) -> Result<BridgeOutput> {
        let output = self
            .command(args)
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.executable.display()))?;
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        let result = BridgeOutput { status: exit_code(output.status), output: trim_newlines(combined) };
        trace!(?result, "adb finished");
        Ok(result)
    }

    #[instrument(level = "debug", skip(self), err)]
    async fn exec_to_file(&self, args: &[&str], dest: &Path) -> Result<BridgeOutput> {
        let (file, _) = fs_err::File::create(dest)?.into_parts();
        // `output()` would replace the stdout redirect with a pipe.
        let child = self
            .command(args)
            .stdout(Stdio::from(file))
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to run {}", self.executable.display()))?;
        let output = child.wait_with_output().await.context("Failed to wait for adb")?;
        let result = BridgeOutput {
            status: exit_code(output.status),
            output: trim_newlines(String::from_utf8_lossy(&output.stderr).into_owned()),
        };
        trace!(?result, "adb finished");
        Ok(result)
    }
}

/// Resolves `path` to an absolute executable path, searching `PATH` for bare names.
fn resolve_binary_path(path: &Path) -> Result<PathBuf> {
    let found = if path.components().count() == 1 {
        which::which(path)?
    } else {
        anyhow::ensure!(path.is_file(), "{} does not exist", path.display());
        path.to_path_buf()
    };
    Ok(fs_err::canonicalize(found)?)
}

fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

fn trim_newlines(mut text: String) -> String {
    let trimmed = text.trim_end_matches(['\r', '\n']).len();
    text.truncate(trimmed);
    text
}
