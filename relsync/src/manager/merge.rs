//! Best-effort merge of an extracted tree into a live installation.
//!
//! Every file in the source tree is copied over the destination, creating
//! directories as needed and overwriting unconditionally. Nothing at the
//! destination is ever deleted, so files removed upstream persist.
//!
//! A single entry failing (typically a file locked by the running
//! application) is recorded in the [`MergeReport`] and the merge carries on
//! with the remaining entries. Only failing to create the destination root
//! or to list the source root aborts the merge. Symbolic links in the source
//! are skipped, never followed.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::error::{ManagerError, ManagerResult};

/// Names never copied, regardless of location in the tree.
const NOISE_NAMES: &[&str] = &["__MACOSX", ".DS_Store", "Thumbs.db", "desktop.ini"];

/// Hidden-file extensions that are still installed by default.
///
/// Some redscript mods ship their sources as dot-files (`.module.reds`).
pub const DEFAULT_ALLOWED_HIDDEN_EXTENSIONS: &[&str] = &["reds"];

/// Options controlling which entries a merge skips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Extensions (without the dot, case-insensitive) of hidden files that
    /// are copied anyway.
    pub allowed_hidden_extensions: Vec<String>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            allowed_hidden_extensions: DEFAULT_ALLOWED_HIDDEN_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl MergeOptions {
    /// Whether an entry name is noise that must not be merged.
    ///
    /// # Example
    ///
    /// ```
    /// use relsync::manager::MergeOptions;
    ///
    /// let options = MergeOptions::default();
    /// assert!(options.is_noise("__MACOSX"));
    /// assert!(options.is_noise(".git"));
    /// assert!(!options.is_noise(".module.reds"));
    /// assert!(!options.is_noise("plugin.dll"));
    /// ```
    pub fn is_noise(&self, name: &str) -> bool {
        if NOISE_NAMES.iter().any(|n| n.eq_ignore_ascii_case(name)) {
            return true;
        }
        if !name.starts_with('.') {
            return false;
        }

        let allowed = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.allowed_hidden_extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            });
        !allowed
    }
}

/// One entry that could not be merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeFailure {
    /// Destination path of the failed entry.
    pub path: PathBuf,
    /// Underlying error message.
    pub reason: String,
}

/// Outcome of a merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Files written to the destination.
    pub files_copied: usize,
    /// Directories newly created at the destination.
    pub dirs_created: usize,
    /// Source entries skipped as noise or because they are symbolic links.
    pub skipped: Vec<PathBuf>,
    /// Entries that failed; the merge continued past each of them.
    pub failures: Vec<MergeFailure>,
}

impl MergeReport {
    /// Whether every entry was merged.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fold another report into this one.
    pub fn absorb(&mut self, other: MergeReport) {
        self.files_copied += other.files_copied;
        self.dirs_created += other.dirs_created;
        self.skipped.extend(other.skipped);
        self.failures.extend(other.failures);
    }

    fn fail(&mut self, path: &Path, reason: impl ToString) {
        let reason = reason.to_string();
        warn!(path = %path.display(), %reason, "Failed to merge entry");
        self.failures.push(MergeFailure {
            path: path.to_path_buf(),
            reason,
        });
    }
}

/// Merge `source` into `dest`.
///
/// # Errors
///
/// Only when `dest` cannot be created or `source` cannot be listed.
/// Per-entry failures are reported in [`MergeReport::failures`].
pub fn merge_tree(source: &Path, dest: &Path, options: &MergeOptions) -> ManagerResult<MergeReport> {
    fs::create_dir_all(dest).map_err(|e| ManagerError::CreateDirFailed {
        path: dest.to_path_buf(),
        source: e,
    })?;

    let entries = fs::read_dir(source).map_err(|e| ManagerError::ReadFailed {
        path: source.to_path_buf(),
        source: e,
    })?;

    let mut report = MergeReport::default();
    for entry in entries {
        match entry {
            Ok(entry) => merge_entry(&entry.path(), &dest.join(entry.file_name()), options, &mut report),
            Err(e) => report.fail(source, e),
        }
    }

    debug!(
        source = %source.display(),
        dest = %dest.display(),
        files = report.files_copied,
        failures = report.failures.len(),
        "Merge complete"
    );
    Ok(report)
}

fn merge_entry(source: &Path, dest: &Path, options: &MergeOptions, report: &mut MergeReport) {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    if options.is_noise(&name) {
        debug!(path = %source.display(), "Skipping noise entry");
        report.skipped.push(source.to_path_buf());
        return;
    }

    let file_type = match fs::symlink_metadata(source) {
        Ok(meta) => meta.file_type(),
        Err(e) => {
            report.fail(dest, e);
            return;
        }
    };

    // Links are never followed: a release must not pull host files into the
    // installation.
    if file_type.is_symlink() {
        warn!(path = %source.display(), "Skipping symbolic link");
        report.skipped.push(source.to_path_buf());
    } else if file_type.is_dir() {
        merge_dir(source, dest, options, report);
    } else if let Err(e) = fs::copy(source, dest) {
        report.fail(dest, e);
    } else {
        report.files_copied += 1;
    }
}

fn merge_dir(source: &Path, dest: &Path, options: &MergeOptions, report: &mut MergeReport) {
    if !dest.is_dir() {
        if let Err(e) = fs::create_dir_all(dest) {
            report.fail(dest, e);
            return;
        }
        report.dirs_created += 1;
    }

    let entries = match fs::read_dir(source) {
        Ok(entries) => entries,
        Err(e) => {
            report.fail(dest, e);
            return;
        }
    };

    for entry in entries {
        match entry {
            Ok(entry) => merge_entry(&entry.path(), &dest.join(entry.file_name()), options, report),
            Err(e) => report.fail(dest, e),
        }
    }
}
