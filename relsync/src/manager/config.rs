//! Configuration for the synchronizer.

use std::path::PathBuf;
use std::time::Duration;

use super::extractor::DEFAULT_UNRAR_TOOL;
use super::merge::MergeOptions;

/// Default pause between two components in a cycle.
pub const DEFAULT_COMPONENT_DELAY: Duration = Duration::from_millis(1500);

/// Configuration for the [`Synchronizer`](super::Synchronizer).
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Installation root. Component subpaths are resolved against it.
    pub install_dir: PathBuf,

    /// Directory holding one version record per component.
    pub state_dir: PathBuf,

    /// Directory for per-job downloads and extraction output.
    pub scratch_dir: PathBuf,

    /// Pause between two components in a cycle.
    pub component_delay: Duration,

    /// Executable renamed while a cycle runs, if any.
    ///
    /// Relative paths are resolved against `install_dir`.
    pub guard_executable: Option<PathBuf>,

    /// External tool used for RAR archives.
    pub unrar_tool: PathBuf,

    /// Noise filtering for merges.
    pub merge: MergeOptions,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            install_dir: PathBuf::from("."),
            state_dir: PathBuf::from("state"),
            scratch_dir: std::env::temp_dir().join("relsync"),
            component_delay: DEFAULT_COMPONENT_DELAY,
            guard_executable: None,
            unrar_tool: PathBuf::from(DEFAULT_UNRAR_TOOL),
            merge: MergeOptions::default(),
        }
    }
}

impl SyncConfig {
    /// Create a new configuration with the given installation directory.
    pub fn new(install_dir: PathBuf) -> Self {
        Self {
            install_dir,
            ..Default::default()
        }
    }

    /// Set the state directory.
    pub fn with_state_dir(mut self, path: PathBuf) -> Self {
        self.state_dir = path;
        self
    }

    /// Set the scratch directory.
    pub fn with_scratch_dir(mut self, path: PathBuf) -> Self {
        self.scratch_dir = path;
        self
    }

    /// Set the pause between components.
    pub fn with_component_delay(mut self, delay: Duration) -> Self {
        self.component_delay = delay;
        self
    }

    /// Guard the given executable during cycles.
    pub fn with_guard_executable(mut self, path: Option<PathBuf>) -> Self {
        self.guard_executable = path;
        self
    }

    /// Set the RAR extraction tool.
    pub fn with_unrar_tool(mut self, tool: PathBuf) -> Self {
        self.unrar_tool = tool;
        self
    }

    /// Set the merge options.
    pub fn with_merge_options(mut self, options: MergeOptions) -> Self {
        self.merge = options;
        self
    }

    /// Absolute location of the guarded executable.
    pub fn guard_path(&self) -> Option<PathBuf> {
        self.guard_executable
            .as_ref()
            .map(|exe| self.install_dir.join(exe))
    }
}
