use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter},
    path::{Path, PathBuf},
};

use walkdir::{DirEntry, WalkDir};
use zip::{CompressionMethod, ZipArchive, ZipWriter, write::SimpleFileOptions};

/// Packs the contents of `source_dir` into a zip archive at `dest_archive`.
///
/// Entries are stored relative to `source_dir`, so unpacking the archive into a
/// directory recreates the files directly inside it.
pub async fn pack(source_dir: &Path, dest_archive: &Path) -> io::Result<()> {
    let (source_dir, dest_archive) = (source_dir.to_path_buf(), dest_archive.to_path_buf());
    crate::blocking(move || pack_blocking(&source_dir, &dest_archive)).await
}

/// Unpacks the zip archive at `source_archive` into `dest_dir`, creating it if needed.
pub async fn unpack(source_archive: &Path, dest_dir: &Path) -> io::Result<()> {
    let (source_archive, dest_dir) = (source_archive.to_path_buf(), dest_dir.to_path_buf());
    crate::blocking(move || unpack_blocking(&source_archive, &dest_dir)).await
}

fn pack_blocking(source_dir: &Path, dest_archive: &Path) -> io::Result<()> {
    if !source_dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotADirectory,
            format!("source is not a directory: {}", source_dir.display()),
        ));
    }

    let file = File::create(dest_archive)?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(true);

    for path in walk_sorted(source_dir)? {
        let name = entry_name(source_dir, &path);
        if path.is_dir() {
            writer.add_directory(name, options).map_err(io::Error::other)?;
        } else {
            writer.start_file(name, options).map_err(io::Error::other)?;
            let mut reader = BufReader::new(File::open(&path)?);
            io::copy(&mut reader, &mut writer)?;
        }
    }

    writer.finish().map_err(io::Error::other)?;
    Ok(())
}

fn unpack_blocking(source_archive: &Path, dest_dir: &Path) -> io::Result<()> {
    let file = File::open(source_archive)?;
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(io::Error::other)?;
    fs::create_dir_all(dest_dir)?;
    archive.extract(dest_dir).map_err(io::Error::other)
}

/// Lists every file and directory below `root` (excluding `root`), parents first.
fn walk_sorted(root: &Path) -> io::Result<Vec<PathBuf>> {
    WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| entry.map(DirEntry::into_path).map_err(io::Error::from))
        .collect()
}

/// Zip entry names always use `/` separators.
fn entry_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
