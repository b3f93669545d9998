//! Scripted stand-ins for adb used by the unit tests.

use std::{
    fmt,
    path::Path,
    sync::{Arc, Mutex},
};

use anyhow::Result;
use async_trait::async_trait;

use crate::{
    adb::{Bridge, BridgeOutput},
    platform::Platform,
};

type Handler = dyn Fn(&[&str]) -> (i32, String) + Send + Sync;

/// Bridge answering every invocation from a closure and recording the calls.
///
/// `exec_to_file` writes the closure's output into the destination file the way
/// a shell redirect would.
#[derive(Clone)]
pub(crate) struct FakeBridge {
    platform: Platform,
    handler: Arc<Handler>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl fmt::Debug for FakeBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeBridge").field("platform", &self.platform).finish_non_exhaustive()
    }
}

impl FakeBridge {
    pub(crate) fn new(
        platform: Platform,
        handler: impl Fn(&[&str]) -> (i32, String) + Send + Sync + 'static,
    ) -> Self {
        Self { platform, handler: Arc::new(handler), calls: Arc::default() }
    }

    /// Every invocation so far, arguments joined with spaces.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, command: &str) -> usize {
        self.calls().iter().filter(|call| call.starts_with(command)).count()
    }

    /// What the handler says to `args`, without recording the call.
    pub(crate) fn reply(&self, args: &[&str]) -> (i32, String) {
        (self.handler)(args)
    }

    fn answer(&self, args: &[&str]) -> (i32, String) {
        self.calls.lock().unwrap().push(args.join(" "));
        (self.handler)(args)
    }
}

#[async_trait]
impl Bridge for FakeBridge {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn exec(&self, args: &[&str]) -> Result<BridgeOutput> {
        let (status, output) = self.answer(args);
        Ok(BridgeOutput { status, output })
    }

    async fn exec_to_file(&self, args: &[&str], dest: &Path) -> Result<BridgeOutput> {
        let (status, output) = self.answer(args);
        if status == 0 {
            std::fs::write(dest, output.as_bytes())?;
            Ok(BridgeOutput { status, output: String::new() })
        } else {
            std::fs::write(dest, b"")?;
            Ok(BridgeOutput { status, output })
        }
    }
}

/// A package installed on the fake device.
#[derive(Debug, Clone)]
pub(crate) struct FakePackage {
    pub name: &'static str,
    pub path: &'static str,
    pub contents: &'static str,
}

/// Bridge behaving like an attached device with `packages` installed as user apps.
///
/// Installing a file whose name contains `broken` fails the way adb reports an invalid APK.
pub(crate) fn fake_device(platform: Platform, packages: Vec<FakePackage>) -> FakeBridge {
    FakeBridge::new(platform, move |args| match args {
        ["start-server"] | ["kill-server"] => (0, String::new()),
        ["get-state"] => (0, "device".to_string()),
        ["shell", "pm", "list", "packages", "-3"] => (
            0,
            packages.iter().map(|p| format!("package:{}", p.name)).collect::<Vec<_>>().join("\n"),
        ),
        ["shell", "pm", "path", name] => match packages.iter().find(|p| p.name == *name) {
            Some(package) => (0, format!("package:{}", package.path)),
            None => (0, String::new()),
        },
        ["exec-out", "cat", path] => match packages.iter().find(|p| p.path == *path) {
            Some(package) => (0, package.contents.to_string()),
            None => (1, format!("cat: {path}: No such file or directory")),
        },
        ["pull", path, dest] => match packages.iter().find(|p| p.path == *path) {
            Some(package) => match std::fs::write(dest, package.contents) {
                Ok(()) => (0, format!("{path}: 1 file pulled")),
                Err(e) => (1, format!("adb: error: cannot create '{dest}': {e}")),
            },
            None => (1, format!("adb: error: failed to stat remote object '{path}'")),
        },
        ["install", "-d", "-r", local] if local.contains("broken") => {
            (1, "Performing Streamed Install\nadb: failed to install: Failure [INSTALL_FAILED_INVALID_APK]".to_string())
        }
        ["install", "-d", "-r", _] => (0, "Performing Streamed Install\nSuccess".to_string()),
        other => (1, format!("unexpected adb call: {other:?}")),
    })
}
