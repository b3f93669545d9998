//! Backup and restore batches.
//!
//! A [`TaskRunner`] drives one workflow over an established [`Session`],
//! printing progress to the [`Console`] and collecting a per-package
//! [`Outcome`](crate::models::Outcome) for the final [`Summary`].

mod backup;
mod restore;
mod summary;

pub use backup::{BackupOptions, BackupReport};
pub use summary::Summary;

use crate::{adb::Session, console::Console};

/// Extension of a packed backup.
pub const ARCHIVE_EXTENSION: &str = "zip";
/// Extension of an encrypted backup archive.
pub const ENCRYPTED_EXTENSION: &str = "enc";

#[derive(Debug)]
pub struct TaskRunner<'a> {
    session: &'a Session,
    console: &'a mut Console,
}

impl<'a> TaskRunner<'a> {
    pub fn new(session: &'a Session, console: &'a mut Console) -> Self {
        Self { session, console }
    }
}
