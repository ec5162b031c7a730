//! CLI error type and exit codes.

use std::fmt;
use std::path::PathBuf;

use relsync::config::ConfigError;
use relsync::manager::ManagerError;

/// Exit code for configuration problems.
pub const EXIT_CONFIG: i32 = 2;
/// Exit code for any other failure.
pub const EXIT_FAILURE: i32 = 1;

/// Errors surfaced by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be loaded or is incomplete.
    Config(String),
    /// The installation directory does not exist.
    InstallDirMissing(PathBuf),
    /// Logging could not be initialized.
    Logging(String),
    /// A local archive to install does not exist.
    ArchiveNotFound(PathBuf),
    /// A component could not be installed.
    InstallFailed { component: String, reason: String },
    /// The synchronizer could not be constructed or run.
    Sync(ManagerError),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::InstallDirMissing(_) => EXIT_CONFIG,
            _ => EXIT_FAILURE,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::InstallDirMissing(path) => write!(
                f,
                "Installation directory {} does not exist. \
                 Set install_dir in config.ini [paths] or RELSYNC_INSTALL_DIR.",
                path.display()
            ),
            CliError::Logging(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::ArchiveNotFound(path) => {
                write!(f, "Archive not found: {}", path.display())
            }
            CliError::InstallFailed { component, reason } => {
                write!(f, "Failed to install {}: {}", component, reason)
            }
            CliError::Sync(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Sync(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<ManagerError> for CliError {
    fn from(e: ManagerError) -> Self {
        CliError::Sync(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Config("x".to_string()).exit_code(), 2);
        assert_eq!(
            CliError::InstallDirMissing(PathBuf::from("/game")).exit_code(),
            2
        );
        assert_eq!(
            CliError::ArchiveNotFound(PathBuf::from("a.zip")).exit_code(),
            1
        );
        assert_eq!(
            CliError::Sync(ManagerError::HttpError("tls".to_string())).exit_code(),
            1
        );
    }

    #[test]
    fn test_config_error_conversion() {
        let err: CliError = ConfigError::Missing("paths.install_dir".to_string()).into();
        assert_eq!(err.exit_code(), EXIT_CONFIG);
        assert!(err.to_string().contains("paths.install_dir"));
    }
}
