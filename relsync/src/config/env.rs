//! Environment overrides.
//!
//! Each setting has a `RELSYNC_` variable and a short legacy alias used by
//! container deployments; the `RELSYNC_` name wins when both are set.

use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::component::parse_component_list;

use super::file::{parse_bool, parse_number, ConfigFile};
use super::ConfigError;

pub const ENV_INSTALL_DIR: (&str, &str) = ("RELSYNC_INSTALL_DIR", "GAME_DIR");
pub const ENV_STATE_DIR: (&str, &str) = ("RELSYNC_STATE_DIR", "STATE_DIR");
pub const ENV_SCRATCH_DIR: (&str, &str) = ("RELSYNC_SCRATCH_DIR", "TMP_DIR");
pub const ENV_POLL_INTERVAL: (&str, &str) = ("RELSYNC_POLL_INTERVAL", "POLL_INTERVAL");
pub const ENV_COMPONENTS: (&str, &str) = ("RELSYNC_COMPONENTS", "MODS");
pub const ENV_RUN_ONCE: (&str, &str) = ("RELSYNC_RUN_ONCE", "RUN_ONCE");
pub const ENV_TOKEN: &str = "GITHUB_TOKEN";

impl ConfigFile {
    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides using `lookup` to read variables.
    ///
    /// Components listed in the components variable (one
    /// `name,owner/repo,path[,pattern]` per line) are appended to those from
    /// the file.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |(primary, alias): (&str, &str)| {
            lookup(primary)
                .or_else(|| lookup(alias))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(dir) = get(ENV_INSTALL_DIR) {
            self.paths.install_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = get(ENV_STATE_DIR) {
            self.paths.state_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get(ENV_SCRATCH_DIR) {
            self.paths.scratch_dir = PathBuf::from(dir);
        }
        if let Some(secs) = get(ENV_POLL_INTERVAL) {
            self.sync.poll_interval = Duration::from_secs(parse_number(ENV_POLL_INTERVAL.0, &secs)?);
        }
        if let Some(flag) = get(ENV_RUN_ONCE) {
            self.sync.run_once = parse_bool(ENV_RUN_ONCE.0, &flag)?;
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|t| !t.trim().is_empty()) {
            self.github.token = Some(token.trim().to_string());
        }
        if let Some(list) = get(ENV_COMPONENTS) {
            let components = parse_component_list(&list);
            debug!(count = components.len(), "Components from environment");
            self.components.extend(components);
        }

        Ok(())
    }
}
