//! Shared helpers for commands.

use std::path::Path;

use relsync::config::{config_file_path, ConfigFile};
use relsync::manager::{
    ComponentOutcome, CycleReport, GitHubResolver, HttpDownloader, SyncConfig, Synchronizer,
};

use crate::error::CliError;

/// Synchronizer wired to GitHub.
pub type GitHubSynchronizer = Synchronizer<GitHubResolver, HttpDownloader>;

/// Load the configuration file (explicit path or default) and apply
/// environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_file_path);
    let mut config = ConfigFile::load_from(&path)?;
    config.apply_env()?;
    Ok(config)
}

/// Resolve the synchronizer configuration, requiring an existing
/// installation directory.
pub fn require_sync_config(config: &ConfigFile) -> Result<SyncConfig, CliError> {
    let sync_config = config.to_sync_config()?;
    if !sync_config.install_dir.is_dir() {
        return Err(CliError::InstallDirMissing(sync_config.install_dir));
    }
    Ok(sync_config)
}

/// Build a synchronizer using the configured GitHub settings.
pub fn build_synchronizer(
    config: &ConfigFile,
    sync_config: SyncConfig,
) -> Result<GitHubSynchronizer, CliError> {
    let github = &config.github;
    let resolver =
        GitHubResolver::with_settings(github.api_url.clone(), github.token.clone(), github.timeout)?;
    let downloader =
        HttpDownloader::with_timeout(github.download_timeout)?.with_token(github.token.clone());
    Ok(Synchronizer::new(sync_config, resolver, downloader))
}

/// Print one line per component outcome.
pub fn print_report(report: &CycleReport) {
    for (name, outcome) in &report.outcomes {
        print_outcome(name, outcome);
    }
}

pub fn print_outcome(name: &str, outcome: &ComponentOutcome) {
    println!("  {:<24} {}", name, outcome);
    if let ComponentOutcome::Installed { report, .. } = outcome {
        for failure in &report.failures {
            println!("    ! {}: {}", failure.path.display(), failure.reason);
        }
    }
}
