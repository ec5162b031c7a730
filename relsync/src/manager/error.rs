//! Error types for the synchronization pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;

/// Errors that can occur while fetching, extracting and merging components.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// Failed to read a file or directory.
    #[error("failed to read {}: {source}", path.display())]
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write a file or directory.
    #[error("failed to write {}: {source}", path.display())]
    WriteFailed { path: PathBuf, source: io::Error },

    /// Failed to create a directory.
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDirFailed { path: PathBuf, source: io::Error },

    /// Failed to download an asset.
    #[error("failed to download {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Network timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// Downloaded asset does not match the digest published by the host.
    #[error("checksum mismatch for {filename}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        filename: String,
        expected: String,
        actual: String,
    },

    /// The archive extension is not one the extractor understands.
    #[error("unsupported archive type: {}", path.display())]
    UnsupportedArchive { path: PathBuf },

    /// Archive extraction failed.
    #[error("failed to extract {}: {reason}", path.display())]
    ExtractionFailed { path: PathBuf, reason: String },

    /// The application guard could not be acquired or inspected.
    #[error("executable guard failed for {}: {reason}", path.display())]
    GuardFailed { path: PathBuf, reason: String },

    /// HTTP client could not be constructed.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Invalid asset selector pattern.
    #[error("invalid asset pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl ManagerError {
    /// Whether this error means "skip this component" rather than "fail it".
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedArchive { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_unsupported_display() {
        let err = ManagerError::UnsupportedArchive {
            path: PathBuf::from("/tmp/tool.7z"),
        };
        assert_eq!(err.to_string(), "unsupported archive type: /tmp/tool.7z");
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_checksum_mismatch_display() {
        let err = ManagerError::ChecksumMismatch {
            filename: "tool.zip".to_string(),
            expected: "abc123".to_string(),
            actual: "def456".to_string(),
        };
        assert!(err.to_string().contains("checksum mismatch"));
        assert!(err.to_string().contains("abc123"));
        assert!(err.to_string().contains("def456"));
        assert!(!err.is_unsupported());
    }

    #[test]
    fn test_io_errors_expose_source() {
        let err = ManagerError::WriteFailed {
            path: PathBuf::from("/game/bin/tool.dll"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "in use"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("/game/bin/tool.dll"));
    }
}
