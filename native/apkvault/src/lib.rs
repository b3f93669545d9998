//! Storage helpers for apkmass backups: zip packing of a backup directory and
//! passphrase based encryption of the resulting archive.
//!
//! Both halves are blocking file operations. The async entry points run them on
//! the blocking pool so callers on a tokio runtime can simply await them.

pub mod archive;
pub mod crypto;

pub use archive::{pack, unpack};
pub use crypto::{decrypt, encrypt};

use std::io;

/// Runs `f` on the tokio blocking pool and flattens the join error into `io::Error`.
async fn blocking<F>(f: F) -> io::Result<()>
where
    F: FnOnce() -> io::Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(io::Error::other)?
}
