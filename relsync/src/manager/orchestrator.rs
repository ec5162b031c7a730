//! Synchronization orchestrator.
//!
//! For each configured component the [`Synchronizer`] runs a strictly
//! sequential pipeline:
//!
//! ```text
//! resolve ─► compare ─► format check ─► fetch ─► extract ─► merge ─► record
//! ```
//!
//! Components are processed one at a time with a configurable pause in
//! between. A failure in one component never stops the cycle; it is
//! reported as that component's [`ComponentOutcome`] and the version record
//! stays untouched so the next cycle retries.

use std::fmt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::component::ComponentSpec;
use crate::version::{is_remote_newer, normalize, VersionRegistry};

use super::config::SyncConfig;
use super::download::verify_sha256;
use super::error::ManagerResult;
use super::extractor::{effective_root, ArchiveExtractor, ArchiveFormat};
use super::guard::ExecutableGuard;
use super::merge::{merge_tree, MergeReport};
use super::scratch::{ScratchJob, ScratchSpace};
use super::traits::{ArchiveDownloader, ReleaseAsset, ReleaseResolver};

/// Why a component was left alone this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The host reported no usable release.
    NoRelease,
    /// A selected asset has a format the extractor cannot handle.
    UnsupportedArchive(String),
    /// The guarded application is running.
    ApplicationRunning,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRelease => write!(f, "no release found"),
            Self::UnsupportedArchive(name) => write!(f, "unsupported archive: {}", name),
            Self::ApplicationRunning => write!(f, "application is running"),
        }
    }
}

/// Result of synchronizing one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentOutcome {
    /// A new version was merged into the installation and recorded.
    Installed {
        version: String,
        assets: Vec<String>,
        report: MergeReport,
    },
    /// The recorded version is current.
    UpToDate { version: String },
    /// Nothing was attempted.
    Skipped(SkipReason),
    /// The pipeline failed; the version record was not changed.
    Failed { reason: String },
}

impl ComponentOutcome {
    /// Short label for summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Installed { .. } => "installed",
            Self::UpToDate { .. } => "up to date",
            Self::Skipped(_) => "skipped",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for ComponentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installed {
                version, report, ..
            } => {
                write!(f, "installed {} ({} files", version, report.files_copied)?;
                if !report.failures.is_empty() {
                    write!(f, ", {} failed", report.failures.len())?;
                }
                write!(f, ")")
            }
            Self::UpToDate { version } => write!(f, "up to date ({})", version),
            Self::Skipped(reason) => write!(f, "skipped: {}", reason),
            Self::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

/// Outcomes of one cycle, in component order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub outcomes: Vec<(String, ComponentOutcome)>,
}

impl CycleReport {
    /// Number of components that installed a new version.
    pub fn installed(&self) -> usize {
        self.count(|o| matches!(o, ComponentOutcome::Installed { .. }))
    }

    /// Number of components whose pipeline failed.
    pub fn failed(&self) -> usize {
        self.count(ComponentOutcome::is_failed)
    }

    /// Outcome recorded for the component named `name`.
    pub fn outcome(&self, name: &str) -> Option<&ComponentOutcome> {
        self.outcomes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, outcome)| outcome)
    }

    fn count(&self, pred: impl Fn(&ComponentOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }

    fn uniform(components: &[ComponentSpec], outcome: ComponentOutcome) -> Self {
        Self {
            outcomes: components
                .iter()
                .map(|c| (c.name.clone(), outcome.clone()))
                .collect(),
        }
    }
}

/// Version implied by a local archive's file name.
///
/// The archive extension and a leading `v` are removed:
/// `v2.1.0.zip` → `2.1.0`. Returns `None` for unsupported formats.
pub fn local_archive_version(archive: &Path) -> Option<String> {
    ArchiveFormat::strip_extension(archive).map(|stem| normalize(&stem))
}

/// Acquires the executable guard for a cycle.
type GuardAcquirer = fn(&Path) -> ManagerResult<Option<ExecutableGuard>>;

/// Runs synchronization cycles against a release host.
pub struct Synchronizer<R, D> {
    config: SyncConfig,
    acquire_guard: GuardAcquirer,
    registry: VersionRegistry,
    extractor: ArchiveExtractor,
    scratch: ScratchSpace,
    resolver: R,
    downloader: D,
}

impl<R: ReleaseResolver, D: ArchiveDownloader> Synchronizer<R, D> {
    /// Create a synchronizer from an explicit configuration.
    pub fn new(config: SyncConfig, resolver: R, downloader: D) -> Self {
        Self {
            registry: VersionRegistry::new(config.state_dir.clone()),
            extractor: ArchiveExtractor::new().with_unrar_tool(config.unrar_tool.clone()),
            scratch: ScratchSpace::new(config.scratch_dir.clone()),
            acquire_guard: ExecutableGuard::acquire,
            config,
            resolver,
            downloader,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn registry(&self) -> &VersionRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn downloader(&self) -> &D {
        &self.downloader
    }

    /// Synchronize every component once, in order.
    ///
    /// When a guard executable is configured it is held for the whole
    /// cycle; if the application is running every component is skipped.
    pub fn run_cycle(&self, components: &[ComponentSpec]) -> CycleReport {
        let started = Instant::now();
        info!(components = components.len(), "Starting sync cycle");

        let _guard = match self.config.guard_path() {
            Some(path) => match (self.acquire_guard)(&path) {
                Ok(Some(guard)) => Some(guard),
                Ok(None) => {
                    info!(path = %path.display(), "Application is running, skipping cycle");
                    return CycleReport::uniform(
                        components,
                        ComponentOutcome::Skipped(SkipReason::ApplicationRunning),
                    );
                }
                Err(e) => {
                    error!(error = %e, "Failed to acquire executable guard");
                    return CycleReport::uniform(
                        components,
                        ComponentOutcome::Failed {
                            reason: e.to_string(),
                        },
                    );
                }
            },
            None => None,
        };

        let mut report = CycleReport::default();
        for (index, spec) in components.iter().enumerate() {
            if index > 0 && !self.config.component_delay.is_zero() {
                thread::sleep(self.config.component_delay);
            }
            let outcome = self.sync_component(spec);
            report.outcomes.push((spec.name.clone(), outcome));
        }

        info!(
            installed = report.installed(),
            failed = report.failed(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Sync cycle complete"
        );
        report
    }

    /// Run the full pipeline for one component.
    pub fn sync_component(&self, spec: &ComponentSpec) -> ComponentOutcome {
        debug!(component = %spec.name, repo = %spec.identifier, "Checking for updates");

        let release = self.resolver.resolve(&spec.identifier, &spec.selector);
        let tag = match release.tag.as_deref() {
            Some(tag) if release.is_usable() => tag.to_string(),
            _ => {
                info!(component = %spec.name, "No release found");
                return ComponentOutcome::Skipped(SkipReason::NoRelease);
            }
        };

        let local = self.registry.get(&spec.identifier);
        if !is_remote_newer(&local, &tag) {
            info!(component = %spec.name, version = %local, "Up to date");
            return ComponentOutcome::UpToDate { version: local };
        }

        if let Some(asset) = release
            .assets
            .iter()
            .find(|a| ArchiveFormat::from_path(&a.name).is_none())
        {
            info!(component = %spec.name, asset = %asset.name, "Unsupported archive format");
            return ComponentOutcome::Skipped(SkipReason::UnsupportedArchive(asset.name.clone()));
        }

        info!(
            component = %spec.name,
            from = if local.is_empty() { "none" } else { local.as_str() },
            to = %tag,
            "Updating"
        );

        let assets: Vec<String> = release.assets.iter().map(|a| a.name.clone()).collect();
        let result = self
            .scratch
            .create_job(&spec.identifier)
            .and_then(|job| {
                let archives = self.fetch_assets(&job, &release.assets)?;
                self.apply_archives(spec, &tag, &job, &archives)
            });

        self.finish(spec, tag, assets, result)
    }

    /// Install a version from an archive already on disk.
    ///
    /// The version is taken from the file name (`v2.1.0.zip` → `2.1.0`)
    /// and recorded unconditionally; no release lookup or comparison is
    /// made.
    pub fn install_local(&self, spec: &ComponentSpec, archive: &Path) -> ComponentOutcome {
        let name = archive
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| archive.display().to_string());

        let version = match local_archive_version(archive) {
            Some(version) => version,
            None => {
                info!(component = %spec.name, archive = %name, "Unsupported archive format");
                return ComponentOutcome::Skipped(SkipReason::UnsupportedArchive(name));
            }
        };

        info!(component = %spec.name, archive = %archive.display(), %version, "Installing local archive");

        let archives = vec![archive.to_path_buf()];
        let result = self
            .scratch
            .create_job(&spec.identifier)
            .and_then(|job| self.apply_archives(spec, &version, &job, &archives));

        self.finish(spec, version, vec![name], result)
    }

    fn fetch_assets(&self, job: &ScratchJob, assets: &[ReleaseAsset]) -> ManagerResult<Vec<PathBuf>> {
        let mut archives = Vec::with_capacity(assets.len());
        for (index, asset) in assets.iter().enumerate() {
            let dest = job.archive_path(index, &asset.name);
            let bytes = self.downloader.download(&asset.url, &dest)?;
            if let Some(expected) = &asset.sha256 {
                verify_sha256(&dest, expected)?;
            }
            debug!(asset = %asset.name, bytes, "Fetched asset");
            archives.push(dest);
        }
        Ok(archives)
    }

    /// Extract every archive, merge each in order, then record `version`.
    fn apply_archives(
        &self,
        spec: &ComponentSpec,
        version: &str,
        job: &ScratchJob,
        archives: &[PathBuf],
    ) -> ManagerResult<MergeReport> {
        let mut roots = Vec::with_capacity(archives.len());
        for (index, archive) in archives.iter().enumerate() {
            let dir = job.extract_dir(index);
            let files = self.extractor.extract(archive, &dir)?;
            debug!(archive = %archive.display(), files, "Extracted archive");
            roots.push(effective_root(&dir)?);
        }

        let target = spec.install_path(&self.config.install_dir);
        let mut report = MergeReport::default();
        for root in &roots {
            report.absorb(merge_tree(root, &target, &self.config.merge)?);
        }

        self.registry.set(&spec.identifier, version)?;
        Ok(report)
    }

    fn finish(
        &self,
        spec: &ComponentSpec,
        version: String,
        assets: Vec<String>,
        result: ManagerResult<MergeReport>,
    ) -> ComponentOutcome {
        match result {
            Ok(report) => {
                if report.is_clean() {
                    info!(component = %spec.name, %version, files = report.files_copied, "Installed");
                } else {
                    warn!(
                        component = %spec.name,
                        %version,
                        files = report.files_copied,
                        failed = report.failures.len(),
                        "Installed with failed entries"
                    );
                }
                ComponentOutcome::Installed {
                    version,
                    assets,
                    report,
                }
            }
            Err(e) if e.is_unsupported() => {
                info!(component = %spec.name, error = %e, "Unsupported archive format");
                ComponentOutcome::Skipped(SkipReason::UnsupportedArchive(assets.join(", ")))
            }
            Err(e) => {
                error!(component = %spec.name, error = %e, "Update failed");
                ComponentOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::time::Duration;

    use tempfile::TempDir;

    use crate::component::AssetSelector;
    use crate::manager::ReleaseInfo;

    /// Resolver and downloader that only count calls.
    #[derive(Default)]
    struct Counting {
        calls: Cell<usize>,
    }

    impl ReleaseResolver for Counting {
        fn resolve(&self, _identifier: &str, _selector: &AssetSelector) -> ReleaseInfo {
            self.calls.set(self.calls.get() + 1);
            ReleaseInfo::none()
        }
    }

    impl ArchiveDownloader for Counting {
        fn download(&self, _url: &str, _dest: &Path) -> ManagerResult<u64> {
            self.calls.set(self.calls.get() + 1);
            Ok(0)
        }
    }

    fn application_running(_executable: &Path) -> ManagerResult<Option<ExecutableGuard>> {
        Ok(None)
    }

    #[test]
    fn test_running_application_skips_whole_cycle() {
        let temp = TempDir::new().unwrap();
        let config = SyncConfig::new(temp.path().join("game"))
            .with_state_dir(temp.path().join("state"))
            .with_scratch_dir(temp.path().join("scratch"))
            .with_component_delay(Duration::ZERO)
            .with_guard_executable(Some(PathBuf::from("bin/app.exe")));
        let mut sync = Synchronizer::new(config, Counting::default(), Counting::default());
        sync.acquire_guard = application_running;

        let components = vec![
            ComponentSpec::new("owner/one").with_name("one"),
            ComponentSpec::new("owner/two").with_name("two"),
        ];
        let report = sync.run_cycle(&components);

        assert_eq!(report.outcomes.len(), 2);
        for (_, outcome) in &report.outcomes {
            assert_eq!(
                outcome,
                &ComponentOutcome::Skipped(SkipReason::ApplicationRunning)
            );
        }
        assert_eq!(sync.resolver().calls.get(), 0);
        assert_eq!(sync.downloader().calls.get(), 0);
        assert!(!temp.path().join("state").exists());
    }

    #[test]
    fn test_local_archive_version() {
        assert_eq!(
            local_archive_version(Path::new("/downloads/v2.1.0.zip")),
            Some("2.1.0".to_string())
        );
        assert_eq!(
            local_archive_version(Path::new("1.4.tar.gz")),
            Some("1.4".to_string())
        );
        assert_eq!(local_archive_version(Path::new("tool.7z")), None);
    }

    #[test]
    fn test_cycle_report_counts() {
        let report = CycleReport {
            outcomes: vec![
                (
                    "a".to_string(),
                    ComponentOutcome::Installed {
                        version: "1.0".to_string(),
                        assets: vec!["a.zip".to_string()],
                        report: MergeReport::default(),
                    },
                ),
                (
                    "b".to_string(),
                    ComponentOutcome::Failed {
                        reason: "boom".to_string(),
                    },
                ),
                (
                    "c".to_string(),
                    ComponentOutcome::Skipped(SkipReason::NoRelease),
                ),
            ],
        };

        assert_eq!(report.installed(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(
            report.outcome("c"),
            Some(&ComponentOutcome::Skipped(SkipReason::NoRelease))
        );
        assert_eq!(report.outcome("missing"), None);
    }

    #[test]
    fn test_outcome_display() {
        let outcome = ComponentOutcome::Skipped(SkipReason::UnsupportedArchive("x.7z".to_string()));
        assert_eq!(outcome.to_string(), "skipped: unsupported archive: x.7z");

        let outcome = ComponentOutcome::UpToDate {
            version: "2.0".to_string(),
        };
        assert_eq!(outcome.to_string(), "up to date (2.0)");
        assert_eq!(outcome.label(), "up to date");
    }
}
