//! Install command - merge a local archive as a component version.

use std::path::PathBuf;

use relsync::component::ComponentSpec;
use relsync::config::ConfigFile;
use relsync::manager::ComponentOutcome;

use super::common::{build_synchronizer, print_outcome, require_sync_config};
use crate::error::CliError;

/// Arguments for the install command.
pub struct InstallArgs {
    pub archive: PathBuf,
    pub repo: String,
    pub path: Option<String>,
}

/// Run the install command.
///
/// Without `--path`, a component configured with the same repository
/// supplies the install sub-path; otherwise the installation root is used.
pub fn run(config: &ConfigFile, args: InstallArgs) -> Result<(), CliError> {
    if !args.archive.is_file() {
        return Err(CliError::ArchiveNotFound(args.archive));
    }
    let sync_config = require_sync_config(config)?;

    let spec = component_for(config, &args);
    let synchronizer = build_synchronizer(config, sync_config)?;

    let outcome = synchronizer.install_local(&spec, &args.archive);
    print_outcome(&spec.name, &outcome);

    match outcome {
        ComponentOutcome::Installed { .. } => Ok(()),
        other => Err(CliError::InstallFailed {
            component: spec.name,
            reason: other.to_string(),
        }),
    }
}

fn component_for(config: &ConfigFile, args: &InstallArgs) -> ComponentSpec {
    let configured = config
        .components
        .iter()
        .rev()
        .find(|c| c.identifier.eq_ignore_ascii_case(args.repo.trim()))
        .cloned();

    let spec = configured.unwrap_or_else(|| ComponentSpec::new(args.repo.trim()));
    match &args.path {
        Some(path) => spec.with_subpath(path),
        None => spec,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(repo: &str, path: Option<&str>) -> InstallArgs {
        InstallArgs {
            archive: PathBuf::from("v1.0.zip"),
            repo: repo.to_string(),
            path: path.map(str::to_string),
        }
    }

    #[test]
    fn test_component_for_uses_configured_subpath() {
        let config =
            ConfigFile::parse("[component.axl]\nrepo = psiberx/ArchiveXL\npath = archive/pc/mod\n")
                .unwrap();

        let spec = component_for(&config, &args("psiberx/archivexl", None));
        assert_eq!(spec.name, "axl");
        assert_eq!(spec.install_subpath, PathBuf::from("archive/pc/mod"));
    }

    #[test]
    fn test_component_for_path_override() {
        let config = ConfigFile::default();
        let spec = component_for(&config, &args("owner/tool", Some("./mods/tool/")));
        assert_eq!(spec.identifier, "owner/tool");
        assert_eq!(spec.install_subpath, PathBuf::from("mods/tool"));
    }
}
