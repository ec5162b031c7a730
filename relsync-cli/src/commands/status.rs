//! Status command - show configured components and recorded versions.

use std::path::Path;

use relsync::config::ConfigFile;
use relsync::version::{sanitize_identifier, VersionRegistry};

use crate::error::CliError;

/// Run the status command.
pub fn run(config: &ConfigFile, config_path: &Path) -> Result<(), CliError> {
    println!("Config file:   {}", config_path.display());
    match &config.paths.install_dir {
        Some(dir) if dir.is_dir() => println!("Install dir:   {}", dir.display()),
        Some(dir) => println!("Install dir:   {} (missing)", dir.display()),
        None => println!("Install dir:   (not set)"),
    }
    println!("State dir:     {}", config.paths.state_dir.display());
    println!();

    let registry = VersionRegistry::new(config.paths.state_dir.clone());

    if config.components.is_empty() {
        println!("No components configured.");
    } else {
        println!("Components:");
        for spec in &config.components {
            let version = registry.get(&spec.identifier);
            println!(
                "  {:<24} {:<40} {}",
                spec.name,
                spec.identifier,
                if version.is_empty() { "not installed" } else { version.as_str() }
            );
        }
    }

    // Records left behind by components no longer configured.
    let configured: Vec<String> = config
        .components
        .iter()
        .map(|c| sanitize_identifier(&c.identifier))
        .collect();
    let orphans: Vec<(String, String)> = registry
        .entries()?
        .into_iter()
        .filter(|(key, _)| !configured.contains(key))
        .collect();

    if !orphans.is_empty() {
        println!();
        println!("Unconfigured records:");
        for (key, version) in orphans {
            println!("  {:<24} {}", key, version);
        }
    }

    Ok(())
}
