//! Component synchronization pipeline.
//!
//! This module fetches released archives, unpacks them and merges them into
//! an installation directory:
//!
//! - [`GitHubResolver`]: finds the latest release and its matching assets
//! - [`HttpDownloader`]: streams assets into a scratch job
//! - [`ArchiveExtractor`]: unpacks ZIP, tar/gzip and RAR archives
//! - [`merge_tree`]: copies an extracted tree over the installation
//! - [`Synchronizer`]: runs the pipeline per component and records versions
//!
//! # Example
//!
//! ```ignore
//! use relsync::component::ComponentSpec;
//! use relsync::manager::{GitHubResolver, HttpDownloader, SyncConfig, Synchronizer};
//!
//! let config = SyncConfig::new("/game".into());
//! let sync = Synchronizer::new(config, GitHubResolver::new(None)?, HttpDownloader::new()?);
//! let report = sync.run_cycle(&[ComponentSpec::new("wopss/RED4ext")]);
//! ```

mod config;
mod download;
mod error;
mod extractor;
mod guard;
mod merge;
mod orchestrator;
mod resolver;
mod scratch;
mod traits;

pub use config::{SyncConfig, DEFAULT_COMPONENT_DELAY};
pub use download::{file_sha256, verify_sha256, HttpDownloader, DEFAULT_DOWNLOAD_TIMEOUT_SECS};
pub use error::{ManagerError, ManagerResult};
pub use extractor::{effective_root, ArchiveExtractor, ArchiveFormat, DEFAULT_UNRAR_TOOL};
pub use guard::{ExecutableGuard, LOCK_SUFFIX};
pub use merge::{
    merge_tree, MergeFailure, MergeOptions, MergeReport, DEFAULT_ALLOWED_HIDDEN_EXTENSIONS,
};
pub use orchestrator::{
    local_archive_version, ComponentOutcome, CycleReport, SkipReason, Synchronizer,
};
pub use resolver::{
    select_release, AssetPayload, GitHubResolver, ReleasePayload, DEFAULT_API_URL,
    DEFAULT_LOOKUP_TIMEOUT_SECS,
};
pub use scratch::{ScratchJob, ScratchSpace};
pub use traits::{ArchiveDownloader, ReleaseAsset, ReleaseInfo, ReleaseResolver};
