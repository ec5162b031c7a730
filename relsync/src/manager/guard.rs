//! Keeps the application from starting while components are merged.
//!
//! The guard renames the application's executable out of the way for the
//! duration of a cycle. A running application holds its executable open,
//! which makes the rename fail with a busy or permission error; that is how
//! a running application is detected.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::error::{ManagerError, ManagerResult};

/// Suffix appended to the executable while the guard is held.
pub const LOCK_SUFFIX: &str = ".locked_by_relsync";

#[cfg(windows)]
const BUSY_OS_ERROR: i32 = 32; // ERROR_SHARING_VIOLATION
#[cfg(not(windows))]
const BUSY_OS_ERROR: i32 = 16; // EBUSY

/// Holds the executable renamed until dropped.
#[derive(Debug)]
pub struct ExecutableGuard {
    original: PathBuf,
    locked: PathBuf,
}

impl ExecutableGuard {
    /// Rename `executable` to `<executable>.locked_by_relsync`.
    ///
    /// Returns `Ok(None)` when the rename is refused because the file is in
    /// use, meaning the application is running.
    ///
    /// # Errors
    ///
    /// [`ManagerError::GuardFailed`] when the executable is missing or the
    /// rename fails for any other reason.
    pub fn acquire(executable: &Path) -> ManagerResult<Option<Self>> {
        let locked = locked_path(executable);

        match fs::rename(executable, &locked) {
            Ok(()) => {
                debug!(path = %executable.display(), "Acquired executable guard");
                Ok(Some(Self {
                    original: executable.to_path_buf(),
                    locked,
                }))
            }
            Err(e) if is_in_use(&e) => {
                debug!(path = %executable.display(), error = %e, "Executable is in use");
                Ok(None)
            }
            Err(e) => Err(ManagerError::GuardFailed {
                path: executable.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }

    /// Path of the executable while renamed.
    pub fn locked_path(&self) -> &Path {
        &self.locked
    }
}

impl Drop for ExecutableGuard {
    fn drop(&mut self) {
        match fs::rename(&self.locked, &self.original) {
            Ok(()) => debug!(path = %self.original.display(), "Released executable guard"),
            Err(e) => warn!(
                path = %self.original.display(),
                locked = %self.locked.display(),
                error = %e,
                "Failed to restore executable name"
            ),
        }
    }
}

fn locked_path(executable: &Path) -> PathBuf {
    let mut name = executable.as_os_str().to_os_string();
    name.push(LOCK_SUFFIX);
    PathBuf::from(name)
}

fn is_in_use(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::PermissionDenied || e.raw_os_error() == Some(BUSY_OS_ERROR)
}
