//! Configuration file and environment handling.
//!
//! Settings are read from an INI file (by default
//! `~/.config/relsync/config.ini`), then overridden from the environment.
//! A missing file is not an error; every setting has a default except the
//! installation directory.
//!
//! ```ini
//! [paths]
//! install_dir = /game
//! state_dir = /data/relsync
//!
//! [component.cet]
//! repo = maximegmd/CyberEngineTweaks
//! path = .
//! ```

mod env;
mod file;

use std::path::PathBuf;

use thiserror::Error;

pub use env::{
    ENV_COMPONENTS, ENV_INSTALL_DIR, ENV_POLL_INTERVAL, ENV_RUN_ONCE, ENV_SCRATCH_DIR, ENV_STATE_DIR,
    ENV_TOKEN,
};
pub use file::{
    ConfigFile, GitHubSettings, PathSettings, SyncSettings, DEFAULT_POLL_INTERVAL_SECS,
};

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid INI.
    #[error("failed to parse config file: {0}")]
    Parse(String),

    /// A setting has a value that cannot be used.
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// A required setting is absent.
    #[error("missing required setting {0}")]
    Missing(String),
}

/// Default location of the configuration file.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("relsync")
        .join("config.ini")
}

/// Default directory for version records.
pub fn default_state_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("relsync")
        .join("state")
}
