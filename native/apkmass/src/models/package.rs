use std::fmt;

use anyhow::{Result, ensure};
use clap::ValueEnum;
use lazy_regex::{Lazy, Regex, lazy_regex};
use serde::{Deserialize, Serialize};

/// Anything `pm` may list: system packages such as `android` have no dot,
/// so only blanks and path separators are refused.
pub(crate) static PACKAGE_NAME_REGEX: Lazy<Regex> = lazy_regex!(r"^[^\s/\\]+$");

/// Android package name as `pm` reports it, safe to use as a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageName(String);

impl PackageName {
    /// Validates and constructs a `PackageName` from the provided string-like value.
    pub fn parse(value: impl AsRef<str>) -> Result<Self> {
        let value_ref = value.as_ref();
        ensure!(PACKAGE_NAME_REGEX.is_match(value_ref), "Invalid package name: '{}'", value_ref);
        Ok(Self(value_ref.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Local file name of the package binary in a backup.
    pub fn apk_file_name(&self) -> String {
        format!("{}.apk", self.0)
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An installed package and where its binary lives on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    pub name: PackageName,
    pub device_path: String,
}

/// Which installed packages `pm list packages` reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PackageScope {
    All,
    /// Third party packages only
    #[default]
    User,
    System,
}

impl PackageScope {
    /// Filter flag passed to `pm list packages`.
    pub fn flag(self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::User => Some("-3"),
            Self::System => Some("-S"),
        }
    }
}
