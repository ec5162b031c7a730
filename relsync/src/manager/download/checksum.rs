//! SHA-256 verification of downloaded release assets.
//!
//! GitHub publishes a `sha256:` digest for each asset on recent releases.
//! When present, the downloaded scratch file is hashed and compared before
//! it is handed to the extractor.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::manager::error::{ManagerError, ManagerResult};

/// Buffer size for reading files during hashing (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Lowercase hexadecimal SHA-256 of a file's contents.
pub fn file_sha256(path: &Path) -> ManagerResult<String> {
    let mut file = File::open(path).map_err(|e| ManagerError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| ManagerError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Check a downloaded asset against the digest published by the host.
///
/// The comparison is case-insensitive.
pub fn verify_sha256(path: &Path, expected: &str) -> ManagerResult<()> {
    let actual = file_sha256(path)?;
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(ManagerError::ChecksumMismatch {
            filename: path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}
