//! Mass backup and restore of Android packages through adb.
//!
//! [`app::drive`] runs one invocation over an [`adb::Session`]; the backup and
//! restore batches live in [`task`].

pub mod adb;
pub mod app;
pub mod cli;
pub mod console;
pub mod error;
pub mod logging;
pub mod models;
pub mod platform;
pub mod settings;
pub mod task;
pub mod utils;

pub use error::Error;

#[cfg(test)]
mod testing;
