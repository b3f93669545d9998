use std::{
    collections::HashSet,
    ffi::OsString,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use fs_err::tokio as fs;
use time::{OffsetDateTime, macros::format_description};
use tracing::{debug, instrument, warn};

use crate::{Error, models::WorkItem};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Formats a duration as `HH:MM:SS.ss`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs_f64();
    let hours = (total / 3600.0).floor();
    let minutes = ((total - hours * 3600.0) / 60.0).floor();
    let seconds = total - hours * 3600.0 - minutes * 60.0;
    format!("{:0>2}:{:0>2}:{:05.2}", hours as u64, minutes as u64, seconds)
}

/// `[ i/N]` counter, right-aligned to the width of `total`.
pub fn progress_label(index: usize, total: usize) -> String {
    let width = total.to_string().len();
    format!("[{index:>width$}/{total:>width$}]")
}

pub fn to_megabytes(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// Name of the backup directory created at `now`, e.g. `2018-02-12_10-11-12`.
pub fn backup_dir_name(now: OffsetDateTime) -> Result<String> {
    let fmt = format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
    now.format(&fmt).context("Failed to format backup timestamp")
}

/// `path` with `extension` appended, keeping any dots already in the file name.
pub fn append_extension(path: &Path, extension: &str) -> PathBuf {
    let mut raw = OsString::from(path.as_os_str());
    raw.push(".");
    raw.push(extension);
    PathBuf::from(raw)
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() { Ok(()) } else { Err(Error::NotADirectory(dir.to_path_buf()).into()) }
}

/// Returns the only entry of `dir` if that entry is a directory.
pub async fn single_subdirectory(dir: &Path) -> Result<Option<PathBuf>> {
    let mut rd = fs::read_dir(dir).await?;
    let mut found = None;
    while let Some(entry) = rd.next_entry().await? {
        if found.is_some() || !entry.file_type().await?.is_dir() {
            return Ok(None);
        }
        found = Some(entry.path());
    }
    Ok(found)
}

fn is_apk(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("apk"))
}

/// Replaces spaces with underscores in the names of the `.apk` files directly inside `dir`.
///
/// Other files are left alone but still count as taken names.
///
/// A name that would clash with an existing entry gets a `_1`, `_2`, ... suffix
/// before its extension, so no file is overwritten. Returns how many files were renamed.
#[instrument(level = "debug", err)]
pub async fn normalize_file_names(dir: &Path) -> Result<usize> {
    ensure_dir(dir)?;

    let mut taken = HashSet::new();
    let mut spaced = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            warn!(path = %entry.path().display(), "Skipping file name that is not valid UTF-8");
            continue;
        };
        if name.contains(' ') && is_apk(&entry.path()) && entry.file_type().await?.is_file() {
            spaced.push(name.clone());
        }
        taken.insert(name);
    }
    spaced.sort();

    for name in &spaced {
        let target = unique_name(&name.replace(' ', "_"), &taken);
        debug!(from = name, to = target, "Renaming");
        fs::rename(dir.join(name), dir.join(&target)).await?;
        taken.remove(name);
        taken.insert(target);
    }
    Ok(spaced.len())
}

fn unique_name(candidate: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(candidate) {
        return candidate.to_string();
    }
    let (stem, extension) = match candidate.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => (stem, Some(extension)),
        _ => (candidate, None),
    };
    let mut n = 1;
    loop {
        let attempt = match extension {
            Some(extension) => format!("{stem}_{n}.{extension}"),
            None => format!("{stem}_{n}"),
        };
        if !taken.contains(&attempt) {
            return attempt;
        }
        n += 1;
    }
}

/// Lists the `.apk` files directly inside `dir`, sorted by name.
#[instrument(level = "debug", err)]
pub async fn list_apks(dir: &Path) -> Result<Vec<WorkItem>> {
    ensure_dir(dir)?;

    let mut items = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        let path = entry.path();
        if !is_apk(&path) {
            continue;
        }
        let metadata = entry.metadata().await?;
        if metadata.is_file() {
            items.push(WorkItem { local_path: path, size_bytes: metadata.len() });
        }
    }
    items.sort_by(|a, b| a.local_path.cmp(&b.local_path));
    Ok(items)
}

/// Removes a file or a directory tree. Missing paths are ignored.
pub async fn remove_path(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path).await {
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(path).await?,
        Ok(_) => fs::remove_file(path).await?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
