use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time;
use tracing::{debug, info, instrument, warn};

use super::Bridge;
use crate::{Error, console::Console, platform::Platform};

/// Attachment checks made before giving up.
pub const CONNECT_ATTEMPTS: u32 = 3;
/// Pause between two failed attachment checks.
pub const CONNECT_BACKOFF: Duration = Duration::from_secs(3);

/// One run's connection to the device through the adb server.
///
/// The adb server is process-wide state. It is killed before the session
/// begins and again by [`Session::shutdown`], which the driver calls on every
/// exit path.
#[derive(Debug)]
pub struct Session {
    pub(super) bridge: Box<dyn Bridge>,
    server_running: bool,
}

impl Session {
    pub fn new(bridge: Box<dyn Bridge>) -> Self {
        Self { bridge, server_running: false }
    }

    pub fn platform(&self) -> Platform {
        self.bridge.platform()
    }

    pub fn server_running(&self) -> bool {
        self.server_running
    }

    /// Starts the adb server. Safe to call when it is already running.
    #[instrument(level = "debug", skip(self), err)]
    pub async fn start_server(&mut self) -> Result<()> {
        self.bridge.run(&["start-server"], false).await.context("Failed to start adb server")?;
        self.server_running = true;
        Ok(())
    }

    /// Kills the adb server. Safe to call when none is running.
    #[instrument(level = "debug", skip(self), err)]
    pub async fn stop_server(&mut self) -> Result<()> {
        self.bridge.run(&["kill-server"], true).await.context("Failed to kill adb server")?;
        self.server_running = false;
        Ok(())
    }

    /// Whether a device is attached. A missing device is an answer, not an error.
    #[instrument(level = "debug", skip(self), ret, err)]
    pub async fn query_attached(&self) -> Result<bool> {
        let state = self.bridge.run(&["get-state"], true).await?;
        Ok(!state.contains("error"))
    }

    /// Clears any stale adb server, waits for a device and starts a fresh server.
    ///
    /// Makes at most [`CONNECT_ATTEMPTS`] attachment checks with
    /// [`CONNECT_BACKOFF`] between them, then fails with
    /// [`Error::DeviceNotAttached`].
    #[instrument(skip(self, console), err)]
    pub async fn establish(&mut self, console: &mut Console) -> Result<()> {
        self.stop_server().await?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            if self.query_attached().await? {
                debug!(attempt, "Device attached");
                break;
            }
            console.say("No phone connected waiting to connect phone");
            if attempt == CONNECT_ATTEMPTS {
                warn!(attempts = attempt, "Giving up waiting for a device");
                console.say("\nFine i give up bye bye");
                return Err(Error::DeviceNotAttached { attempts: attempt }.into());
            }
            time::sleep(CONNECT_BACKOFF).await;
        }

        console.say("Starting adb server...");
        self.start_server().await?;
        info!("Session established");
        Ok(())
    }

    /// Stops the adb server. Never fails; problems are only logged.
    #[instrument(level = "debug", skip(self))]
    pub async fn shutdown(&mut self) {
        if let Err(e) = self.stop_server().await {
            warn!(error = e.as_ref() as &dyn std::error::Error, "Failed to stop adb server on exit");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    use tokio::time::Instant;

    use super::*;
    use crate::{console::capture::console, testing::FakeBridge};

    /// Bridge whose `get-state` fails `failures` times before reporting a device.
    fn flaky_device(failures: u32) -> FakeBridge {
        let queries = Arc::new(AtomicU32::new(0));
        FakeBridge::new(Platform::Linux, move |args| match args {
            ["get-state"] => {
                if queries.fetch_add(1, Ordering::SeqCst) < failures {
                    (1, "error: no devices/emulators found".to_string())
                } else {
                    (0, "device".to_string())
                }
            }
            _ => (0, String::new()),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn connects_on_third_attempt_after_two_sleeps() {
        let bridge = flaky_device(2);
        let mut session = Session::new(Box::new(bridge.clone()));
        let (mut console, out) = console("");

        let started = Instant::now();
        session.establish(&mut console).await.unwrap();

        assert_eq!(started.elapsed(), CONNECT_BACKOFF * 2);
        assert_eq!(bridge.count("get-state"), 3);
        assert_eq!(bridge.calls().first().map(String::as_str), Some("kill-server"));
        assert_eq!(bridge.calls().last().map(String::as_str), Some("start-server"));
        assert!(session.server_running());
        assert_eq!(
            out.lines().iter().filter(|l| l.starts_with("No phone connected")).count(),
            2
        );
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_three_failures() {
        let bridge = flaky_device(u32::MAX);
        let mut session = Session::new(Box::new(bridge.clone()));
        let (mut console, _) = console("");

        let started = Instant::now();
        let err = session.establish(&mut console).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::DeviceNotAttached { attempts: CONNECT_ATTEMPTS })
        ));
        assert_eq!(bridge.count("get-state"), 3);
        assert_eq!(started.elapsed(), CONNECT_BACKOFF * 2);
        assert_eq!(bridge.count("start-server"), 0);
        assert!(!session.server_running());
    }

    #[tokio::test(start_paused = true)]
    async fn attached_device_needs_no_wait() {
        let bridge = flaky_device(0);
        let mut session = Session::new(Box::new(bridge.clone()));
        let (mut console, _) = console("");

        let started = Instant::now();
        session.establish(&mut console).await.unwrap();

        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(bridge.calls(), ["kill-server", "get-state", "start-server"]);
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let bridge = flaky_device(0);
        let mut session = Session::new(Box::new(bridge.clone()));
        session.shutdown().await;
        session.shutdown().await;
        assert_eq!(bridge.count("kill-server"), 2);
        assert!(!session.server_running());
    }

    #[tokio::test]
    async fn shutdown_tolerates_a_dead_server() {
        let bridge = FakeBridge::new(Platform::Linux, |_| (1, "cannot connect to daemon".to_string()));
        let mut session = Session::new(Box::new(bridge.clone()));
        session.shutdown().await;
        assert_eq!(bridge.count("kill-server"), 1);
    }
}
