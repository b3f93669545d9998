use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use crate::models::PackageScope;

/// Back up and restore installed Android packages over adb.
#[derive(Debug, Parser)]
#[command(name = "apkmass", version)]
#[command(group(ArgGroup::new("mode").required(true).multiple(true).args(["backup", "install"])))]
pub struct Cli {
    /// Back up installed packages into a timestamped folder
    #[arg(short, long)]
    pub backup: bool,

    /// Restore packages from a folder, a .zip or an .enc archive
    #[arg(short, long, value_name = "PATH")]
    pub install: Option<PathBuf>,

    /// Pack the backup folder into a zip archive
    #[arg(short, long, requires = "backup")]
    pub archive: bool,

    /// Encrypt the backup archive with a passphrase
    #[arg(short, long, requires = "archive")]
    pub encrypt: bool,

    /// Which packages to back up [default: from settings, else user]
    #[arg(long, value_enum)]
    pub scope: Option<PackageScope>,

    /// adb executable to use instead of the bundled one or the one on PATH
    #[arg(long, env = "APKMASS_ADB", value_name = "PATH")]
    pub adb: Option<PathBuf>,

    /// Folder new backups are created in [default: from settings, else current folder]
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,
}
