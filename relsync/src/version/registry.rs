//! Persistent record of installed component versions.
//!
//! One small text file per component lives under the state directory,
//! named after the sanitized component identifier and containing exactly
//! the last installed (normalized) version string.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::manager::{ManagerError, ManagerResult};

/// File extension used for version records.
const RECORD_EXTENSION: &str = "version";

/// File-backed store of last-installed versions.
#[derive(Debug, Clone)]
pub struct VersionRegistry {
    state_dir: PathBuf,
}

impl VersionRegistry {
    /// Create a registry rooted at the given state directory.
    ///
    /// The directory is created lazily on the first [`set`](Self::set).
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
        }
    }

    /// Directory holding the version records.
    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Path of the record file for an identifier.
    pub fn record_path(&self, identifier: &str) -> PathBuf {
        self.state_dir
            .join(format!("{}.{}", sanitize_identifier(identifier), RECORD_EXTENSION))
    }

    /// Get the stored version for an identifier.
    ///
    /// Returns an empty string when no record exists. A record that exists
    /// but cannot be read is logged and treated as missing.
    pub fn get(&self, identifier: &str) -> String {
        let path = self.record_path(identifier);
        match fs::read_to_string(&path) {
            Ok(content) => content.trim().to_string(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable version record");
                String::new()
            }
        }
    }

    /// Persist a version for an identifier, replacing any prior record.
    ///
    /// The tag is written verbatim and flushed to disk before returning.
    pub fn set(&self, identifier: &str, tag: &str) -> ManagerResult<()> {
        fs::create_dir_all(&self.state_dir).map_err(|e| ManagerError::CreateDirFailed {
            path: self.state_dir.clone(),
            source: e,
        })?;

        let path = self.record_path(identifier);
        let write = || -> io::Result<()> {
            let mut file = File::create(&path)?;
            file.write_all(tag.as_bytes())?;
            file.sync_all()
        };

        write().map_err(|e| ManagerError::WriteFailed {
            path: path.clone(),
            source: e,
        })
    }

    /// List every stored record as `(sanitized identifier, version)`.
    ///
    /// Sorted by key. A missing state directory yields an empty list.
    pub fn entries(&self) -> ManagerResult<Vec<(String, String)>> {
        let dir = match fs::read_dir(&self.state_dir) {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(ManagerError::ReadFailed {
                    path: self.state_dir.clone(),
                    source: e,
                })
            }
        };

        let mut entries: Vec<(String, String)> = dir
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|e| e.to_str()) == Some(RECORD_EXTENSION)
            })
            .filter_map(|path| {
                let key = path.file_stem()?.to_string_lossy().to_string();
                let version = fs::read_to_string(&path).ok()?.trim().to_string();
                Some((key, version))
            })
            .collect();

        entries.sort();
        Ok(entries)
    }
}

/// Turn a component identifier into a safe single path component.
///
/// Characters outside `[A-Za-z0-9._-]` become `_`, and a leading `.` is
/// replaced so the result is never hidden, `.` or `..`.
///
/// # Example
///
/// ```
/// use relsync::version::sanitize_identifier;
///
/// assert_eq!(sanitize_identifier("yamashi/CyberEngineTweaks"), "yamashi_CyberEngineTweaks");
/// assert_eq!(sanitize_identifier(".."), "_.");
/// ```
pub fn sanitize_identifier(identifier: &str) -> String {
    let mut sanitized: String = identifier
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.starts_with('.') {
        sanitized.replace_range(0..1, "_");
    }
    if sanitized.is_empty() {
        sanitized.push('_');
    }

    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_missing_record_is_empty() {
        let temp = TempDir::new().unwrap();
        let registry = VersionRegistry::new(temp.path().join("state"));

        assert_eq!(registry.get("owner/tool"), "");
    }

    #[test]
    fn test_set_then_get() {
        let temp = TempDir::new().unwrap();
        let registry = VersionRegistry::new(temp.path().join("state"));

        registry.set("owner/tool", "1.2.3").unwrap();

        assert_eq!(registry.get("owner/tool"), "1.2.3");
        assert!(registry.record_path("owner/tool").exists());
    }

    #[test]
    fn test_set_overwrites_previous_value() {
        let temp = TempDir::new().unwrap();
        let registry = VersionRegistry::new(temp.path());

        registry.set("owner/tool", "1.0").unwrap();
        registry.set("owner/tool", "1.1").unwrap();

        assert_eq!(registry.get("owner/tool"), "1.1");
        let raw = fs::read_to_string(registry.record_path("owner/tool")).unwrap();
        assert_eq!(raw, "1.1");
    }

    #[test]
    fn test_get_trims_stored_whitespace() {
        let temp = TempDir::new().unwrap();
        let registry = VersionRegistry::new(temp.path());
        fs::write(registry.record_path("owner/tool"), "  2.0\n").unwrap();

        assert_eq!(registry.get("owner/tool"), "2.0");
    }

    #[test]
    fn test_unreadable_record_is_treated_as_missing() {
        let temp = TempDir::new().unwrap();
        let registry = VersionRegistry::new(temp.path());
        // A directory where the record file should be cannot be read as text.
        fs::create_dir_all(registry.record_path("owner/tool")).unwrap();

        assert_eq!(registry.get("owner/tool"), "");
    }

    #[test]
    fn test_record_path_is_sanitized() {
        let registry = VersionRegistry::new("/state");
        assert_eq!(
            registry.record_path("psiberx/cp2077-archive-xl"),
            PathBuf::from("/state/psiberx_cp2077-archive-xl.version")
        );
        assert_eq!(
            registry.record_path("../../etc/passwd"),
            PathBuf::from("/state/_._.._etc_passwd.version")
        );
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("owner/name"), "owner_name");
        assert_eq!(sanitize_identifier("a\\b:c"), "a_b_c");
        assert_eq!(sanitize_identifier(".hidden"), "_hidden");
        assert_eq!(sanitize_identifier(""), "_");
        assert_eq!(sanitize_identifier(" spaced name "), "spaced_name");
    }

    #[test]
    fn test_entries_lists_records() {
        let temp = TempDir::new().unwrap();
        let registry = VersionRegistry::new(temp.path());
        registry.set("b/tool", "2.0").unwrap();
        registry.set("a/tool", "1.0").unwrap();
        fs::write(temp.path().join("notes.txt"), "ignored").unwrap();

        let entries = registry.entries().unwrap();
        assert_eq!(
            entries,
            vec![
                ("a_tool".to_string(), "1.0".to_string()),
                ("b_tool".to_string(), "2.0".to_string()),
            ]
        );
    }

    #[test]
    fn test_entries_missing_state_dir() {
        let temp = TempDir::new().unwrap();
        let registry = VersionRegistry::new(temp.path().join("absent"));
        assert!(registry.entries().unwrap().is_empty());
    }
}
