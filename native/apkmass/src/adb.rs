//! Everything that talks to the device through the adb executable.
//!
//! [`Bridge`] runs single adb invocations. [`Session`] owns a bridge for the
//! lifetime of a run and layers the connection handshake, package queries,
//! pulls and installs on top of it.

mod bridge;
mod connection;
mod install;
mod packages;
mod transfer;

pub use bridge::{AdbBridge, Bridge, BridgeOutput};
pub use connection::{CONNECT_ATTEMPTS, CONNECT_BACKOFF, Session};
pub use install::{INSTALL_SUCCESS_MARKER, classify_install};
pub use packages::{LISTING_MARKER, parse_listing, strip_marker};
pub use transfer::STAGING_FILE;
