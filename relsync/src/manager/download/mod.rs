//! Asset download support.
//!
//! - [`HttpDownloader`]: streams a release asset into a scratch file
//! - checksum helpers: SHA-256 verification against host-published digests

mod checksum;
mod http;

pub use checksum::{file_sha256, verify_sha256};
pub use http::{HttpDownloader, DEFAULT_DOWNLOAD_TIMEOUT_SECS};
