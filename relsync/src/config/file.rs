//! INI configuration file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, ParseOption, Properties};
use tracing::debug;

use crate::component::{AssetSelector, ComponentSpec};
use crate::manager::{
    MergeOptions, SyncConfig, DEFAULT_API_URL, DEFAULT_COMPONENT_DELAY,
    DEFAULT_DOWNLOAD_TIMEOUT_SECS, DEFAULT_LOOKUP_TIMEOUT_SECS, DEFAULT_UNRAR_TOOL,
};

use super::{config_file_path, default_state_dir, ConfigError};

/// Default time between two cycles in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3600; // 1 hour

/// Prefix of per-component sections (`[component.<name>]`).
const COMPONENT_SECTION_PREFIX: &str = "component.";

/// `[paths]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSettings {
    pub install_dir: Option<PathBuf>,
    pub state_dir: PathBuf,
    pub scratch_dir: PathBuf,
    /// Directory for rolling log files; none logs to stdout only.
    pub log_dir: Option<PathBuf>,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            install_dir: None,
            state_dir: default_state_dir(),
            scratch_dir: std::env::temp_dir().join("relsync"),
            log_dir: None,
        }
    }
}

/// `[sync]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub poll_interval: Duration,
    pub component_delay: Duration,
    pub guard_executable: Option<PathBuf>,
    pub unrar_tool: PathBuf,
    pub allowed_hidden_extensions: Vec<String>,
    /// Run a single cycle instead of polling.
    pub run_once: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            component_delay: DEFAULT_COMPONENT_DELAY,
            guard_executable: None,
            unrar_tool: PathBuf::from(DEFAULT_UNRAR_TOOL),
            allowed_hidden_extensions: MergeOptions::default().allowed_hidden_extensions,
            run_once: false,
        }
    }
}

/// `[github]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubSettings {
    pub api_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
    pub download_timeout: Duration,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout: Duration::from_secs(DEFAULT_LOOKUP_TIMEOUT_SECS),
            download_timeout: Duration::from_secs(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub paths: PathSettings,
    pub sync: SyncSettings,
    pub github: GitHubSettings,
    /// Components in declaration order.
    pub components: Vec<ComponentSpec>,
}

impl ConfigFile {
    /// Load from the default location ([`config_file_path`]).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(content) => {
                debug!(path = %path.display(), "Loaded config file");
                Self::parse(&content)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Parse INI text.
    ///
    /// Backslashes are taken literally so Windows paths and regular
    /// expressions survive unchanged.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let options = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..Default::default()
        };
        let ini = Ini::load_from_str_opt(content, options)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        let mut config = Self::default();

        if let Some(section) = ini.section(Some("paths")) {
            let paths = &mut config.paths;
            if let Some(v) = non_empty(section, "install_dir") {
                paths.install_dir = Some(PathBuf::from(v));
            }
            if let Some(v) = non_empty(section, "state_dir") {
                paths.state_dir = PathBuf::from(v);
            }
            if let Some(v) = non_empty(section, "scratch_dir") {
                paths.scratch_dir = PathBuf::from(v);
            }
            if let Some(v) = non_empty(section, "log_dir") {
                paths.log_dir = Some(PathBuf::from(v));
            }
        }

        if let Some(section) = ini.section(Some("sync")) {
            let sync = &mut config.sync;
            if let Some(v) = non_empty(section, "poll_interval") {
                sync.poll_interval = Duration::from_secs(parse_number("sync.poll_interval", v)?);
            }
            if let Some(v) = non_empty(section, "component_delay_ms") {
                sync.component_delay =
                    Duration::from_millis(parse_number("sync.component_delay_ms", v)?);
            }
            if let Some(v) = non_empty(section, "guard_executable") {
                sync.guard_executable = Some(PathBuf::from(v));
            }
            if let Some(v) = non_empty(section, "unrar_tool") {
                sync.unrar_tool = PathBuf::from(v);
            }
            if let Some(v) = non_empty(section, "run_once") {
                sync.run_once = parse_bool("sync.run_once", v)?;
            }
            if let Some(v) = section.get("allowed_hidden_extensions") {
                sync.allowed_hidden_extensions = v
                    .split(',')
                    .map(|ext| ext.trim().trim_start_matches('.').to_string())
                    .filter(|ext| !ext.is_empty())
                    .collect();
            }
        }

        if let Some(section) = ini.section(Some("github")) {
            let github = &mut config.github;
            if let Some(v) = non_empty(section, "api_url") {
                github.api_url = v.to_string();
            }
            if let Some(v) = non_empty(section, "token") {
                github.token = Some(v.to_string());
            }
            if let Some(v) = non_empty(section, "timeout") {
                github.timeout = Duration::from_secs(parse_number("github.timeout", v)?);
            }
            if let Some(v) = non_empty(section, "download_timeout") {
                github.download_timeout =
                    Duration::from_secs(parse_number("github.download_timeout", v)?);
            }
        }

        for (name, section) in ini.iter() {
            let Some(label) = name.and_then(|n| n.strip_prefix(COMPONENT_SECTION_PREFIX)) else {
                continue;
            };
            config.components.push(parse_component_section(label, section)?);
        }

        Ok(config)
    }

    /// Installation directory, which has no default.
    pub fn install_dir(&self) -> Result<&Path, ConfigError> {
        self.paths
            .install_dir
            .as_deref()
            .ok_or_else(|| ConfigError::Missing("paths.install_dir".to_string()))
    }

    /// Build the synchronizer configuration.
    pub fn to_sync_config(&self) -> Result<SyncConfig, ConfigError> {
        Ok(SyncConfig::new(self.install_dir()?.to_path_buf())
            .with_state_dir(self.paths.state_dir.clone())
            .with_scratch_dir(self.paths.scratch_dir.clone())
            .with_component_delay(self.sync.component_delay)
            .with_guard_executable(self.sync.guard_executable.clone())
            .with_unrar_tool(self.sync.unrar_tool.clone())
            .with_merge_options(MergeOptions {
                allowed_hidden_extensions: self.sync.allowed_hidden_extensions.clone(),
            }))
    }
}

fn parse_component_section(label: &str, section: &Properties) -> Result<ComponentSpec, ConfigError> {
    let key = |field: &str| format!("{}{}.{}", COMPONENT_SECTION_PREFIX, label, field);

    let repo = non_empty(section, "repo").ok_or_else(|| ConfigError::Missing(key("repo")))?;
    let mut spec = ComponentSpec::new(repo)
        .with_name(label.trim())
        .with_subpath(section.get("path").unwrap_or_default());

    if let Some(pattern) = non_empty(section, "asset") {
        let selector = AssetSelector::new(pattern).map_err(|e| ConfigError::InvalidValue {
            key: key("asset"),
            value: pattern.to_string(),
            reason: e.to_string(),
        })?;
        spec = spec.with_selector(selector);
    }

    Ok(spec)
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

pub(super) fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: "expected a non-negative integer".to_string(),
    })
}

pub(super) fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}
