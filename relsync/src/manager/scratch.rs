//! Scratch directories for in-flight component jobs.
//!
//! Each component pipeline gets a private directory under the scratch root
//! holding its downloads and extraction output. The directory is removed
//! when the [`ScratchJob`] is dropped, whether the pipeline succeeded or not.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};

use crate::version::sanitize_identifier;

use super::error::{ManagerError, ManagerResult};

/// Root directory under which scratch jobs are created.
#[derive(Debug, Clone)]
pub struct ScratchSpace {
    root: PathBuf,
}

impl ScratchSpace {
    /// Create a scratch space rooted at `root`. Nothing is created on disk yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The scratch root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a fresh job directory for `identifier`.
    pub fn create_job(&self, identifier: &str) -> ManagerResult<ScratchJob> {
        let stamp = Utc::now().timestamp_millis();
        let base = format!("{}_{}", sanitize_identifier(identifier), stamp);

        // Two jobs for the same identifier within one millisecond get a suffix.
        let mut dir = self.root.join(&base);
        let mut attempt = 1;
        while dir.exists() {
            dir = self.root.join(format!("{}_{}", base, attempt));
            attempt += 1;
        }

        fs::create_dir_all(&dir).map_err(|e| ManagerError::CreateDirFailed {
            path: dir.clone(),
            source: e,
        })?;
        debug!(dir = %dir.display(), "Created scratch job");

        Ok(ScratchJob { dir })
    }
}

/// A job's private scratch directory, removed on drop.
#[derive(Debug)]
pub struct ScratchJob {
    dir: PathBuf,
}

impl ScratchJob {
    /// The job directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Download target for the asset at `index`.
    ///
    /// The index prefix keeps two assets with the same published name apart.
    pub fn archive_path(&self, index: usize, asset_name: &str) -> PathBuf {
        let name = Path::new(asset_name)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "asset".to_string());
        self.dir.join(format!("{}_{}", index, name))
    }

    /// Extraction directory for the asset at `index`.
    pub fn extract_dir(&self, index: usize) -> PathBuf {
        self.dir.join(format!("extracted_{}", index))
    }
}

impl Drop for ScratchJob {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.dir) {
            if self.dir.exists() {
                warn!(dir = %self.dir.display(), error = %e, "Failed to remove scratch job");
            }
        } else {
            debug!(dir = %self.dir.display(), "Removed scratch job");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_job_removed_on_drop() {
        let temp = TempDir::new().unwrap();
        let space = ScratchSpace::new(temp.path().join("scratch"));

        let job = space.create_job("owner/tool").unwrap();
        let dir = job.dir().to_path_buf();
        fs::write(job.archive_path(0, "tool.zip"), b"data").unwrap();
        fs::create_dir_all(job.extract_dir(0).join("nested")).unwrap();
        assert!(dir.is_dir());

        drop(job);
        assert!(!dir.exists());
    }

    #[test]
    fn test_job_name_is_sanitized() {
        let temp = TempDir::new().unwrap();
        let space = ScratchSpace::new(temp.path());

        let job = space.create_job("owner/tool").unwrap();
        let name = job.dir().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("owner_tool_"));
        assert_eq!(job.dir().parent().unwrap(), temp.path());
    }

    #[test]
    fn test_concurrent_jobs_get_distinct_dirs() {
        let temp = TempDir::new().unwrap();
        let space = ScratchSpace::new(temp.path());

        let first = space.create_job("owner/tool").unwrap();
        let second = space.create_job("owner/tool").unwrap();
        assert_ne!(first.dir(), second.dir());
    }

    #[test]
    fn test_archive_path_strips_directories() {
        let temp = TempDir::new().unwrap();
        let job = ScratchSpace::new(temp.path()).create_job("x").unwrap();

        assert_eq!(
            job.archive_path(2, "../../evil.zip"),
            job.dir().join("2_evil.zip")
        );
    }

    #[test]
    fn test_drop_tolerates_already_removed_dir() {
        let temp = TempDir::new().unwrap();
        let job = ScratchSpace::new(temp.path()).create_job("x").unwrap();
        fs::remove_dir_all(job.dir()).unwrap();
        drop(job);
    }
}
