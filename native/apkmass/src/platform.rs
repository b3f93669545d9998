use anyhow::Result;

use crate::Error;

/// Host operating system the bridge executable is run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Mac,
    Linux,
    Windows,
}

impl Platform {
    /// Detects the platform this binary was built for.
    pub fn detect() -> Result<Self> {
        Self::from_os(std::env::consts::OS)
    }

    /// Maps an OS name as reported by `std::env::consts::OS`.
    pub fn from_os(os: &str) -> Result<Self> {
        match os {
            "macos" => Ok(Self::Mac),
            "linux" => Ok(Self::Linux),
            "windows" => Ok(Self::Windows),
            other => Err(Error::UnsupportedPlatform(other.to_string()).into()),
        }
    }

    /// Location of the adb build shipped next to the tool for this platform.
    pub fn bundled_adb(self) -> &'static str {
        match self {
            Self::Mac => "./adb_osx/adb",
            Self::Linux => "./adb_linux/adb",
            Self::Windows => r"adb_win\adb.exe",
        }
    }

    /// Whether package files are streamed through `exec-out` instead of `adb pull`.
    pub fn streams_pulls(self) -> bool {
        match self {
            Self::Mac | Self::Linux => true,
            Self::Windows => false,
        }
    }

    pub fn supports_encryption(self) -> bool {
        match self {
            Self::Mac | Self::Linux => true,
            Self::Windows => false,
        }
    }
}
