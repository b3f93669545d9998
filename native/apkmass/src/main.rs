use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Result, anyhow};
use apkmass::{
    adb::{AdbBridge, Session},
    app::{self, RunOptions},
    cli::Cli,
    console::Console,
    logging::setup_logging,
    platform::Platform,
    settings::SettingsHandler,
};
use clap::{CommandFactory, Parser};
use mimalloc::MiMalloc;
use time::OffsetDateTime;
use tracing::{error, info, warn};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const APP_DIR_NAME: &str = "apkmass";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    println!("Apk Mass Installer Utility \nVersion: {}\n", env!("CARGO_PKG_VERSION"));

    if std::env::args_os().len() <= 1 {
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    }
    let cli = Cli::parse();

    let app_dir = app_dir();
    let _guard = match setup_logging(&app_dir.join("logs")) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Failed to setup logging: {e:#}");
            None
        }
    };
    info!(version = env!("CARGO_PKG_VERSION"), ?cli, "Starting apkmass");

    match run(cli, &app_dir).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = e.as_ref() as &dyn std::error::Error, "Run failed");
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, app_dir: &Path) -> Result<()> {
    let settings = SettingsHandler::new(app_dir).load_or_default();
    let platform = Platform::detect()?;
    let bridge = AdbBridge::resolve(platform, cli.adb.clone().or_else(|| settings.adb_path()))?;
    info!(?platform, adb = %bridge.executable().display(), "Resolved adb");

    let options = RunOptions::new(&cli, &settings, OffsetDateTime::now_utc());
    let mut session = Session::new(Box::new(bridge));
    let mut console = Console::stdio();

    let result = tokio::select! {
        result = app::drive(&mut session, &options, &mut console) => result,
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => {
                warn!("Interrupted by user");
                println!("Received Interrupt");
                Err(anyhow!("Interrupted"))
            }
            Err(e) => Err(anyhow::Error::from(e).context("Failed to listen for Ctrl-C")),
        },
    };
    session.shutdown().await;
    result.map(|_| ())
}

/// Per-user data directory holding settings and logs, or the working directory
/// when the platform has none.
fn app_dir() -> PathBuf {
    dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME)).unwrap_or_else(|| PathBuf::from("."))
}
