//! Synchronizable components and their configuration line format.
//!
//! A component is one externally released unit (for example a GitHub
//! repository publishing a game mod) that is merged into a sub-path of the
//! installation directory.
//!
//! # Line Format
//!
//! Components can be listed one per line:
//!
//! ```text
//! <name>,<owner/repo>,<install subpath>[,<asset pattern>]
//! ```
//!
//! An empty (or `.`) subpath means the installation root. Blank lines and
//! lines with fewer than three fields are ignored.

mod selector;

use std::path::{Path, PathBuf};

use tracing::warn;

pub use selector::{AssetSelector, GENERIC_ASSET_PATTERN};

/// One synchronizable unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSpec {
    /// Label used in log lines.
    pub name: String,

    /// Stable key on the release host (e.g. `owner/name`).
    ///
    /// Also keys the version record, so two specs sharing an identifier
    /// share one record.
    pub identifier: String,

    /// Path relative to the installation root; empty means the root.
    pub install_subpath: PathBuf,

    /// Matcher picking the release asset(s) to install.
    pub selector: AssetSelector,
}

impl ComponentSpec {
    /// Create a spec with the default selector for its identifier.
    pub fn new(identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        Self {
            name: identifier.clone(),
            selector: AssetSelector::default_for(&identifier),
            identifier,
            install_subpath: PathBuf::new(),
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the install sub-path (cleaned with [`clean_subpath`]).
    pub fn with_subpath(mut self, subpath: &str) -> Self {
        self.install_subpath = clean_subpath(subpath);
        self
    }

    /// Override the asset selector.
    pub fn with_selector(mut self, selector: AssetSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Absolute install location under the given root.
    pub fn install_path(&self, install_root: &Path) -> PathBuf {
        if self.install_subpath.as_os_str().is_empty() {
            install_root.to_path_buf()
        } else {
            install_root.join(&self.install_subpath)
        }
    }
}

/// Normalize a configured install sub-path.
///
/// Removes all whitespace, then leading and trailing `.`, `/` and `\`
/// characters, so `./bin/x64/` becomes `bin/x64` and `.` becomes the root.
pub fn clean_subpath(raw: &str) -> PathBuf {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let trimmed = compact.trim_matches(|c| matches!(c, '.' | '/' | '\\'));
    PathBuf::from(trimmed.replace('\\', "/"))
}

/// Parse one component line.
///
/// Returns `None` for lines with fewer than three fields or an empty
/// identifier. An invalid pattern falls back to the identifier default.
pub fn parse_component_line(line: &str) -> Option<ComponentSpec> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() < 3 || parts[1].is_empty() {
        return None;
    }

    let name = if parts[0].is_empty() { parts[1] } else { parts[0] };
    let spec = ComponentSpec::new(parts[1])
        .with_name(name)
        .with_subpath(parts[2]);

    let pattern = parts[3..].join(",");
    if pattern.trim().is_empty() {
        return Some(spec);
    }

    match AssetSelector::new(pattern.trim()) {
        Ok(selector) => Some(spec.with_selector(selector)),
        Err(e) => {
            warn!(component = %name, error = %e, "Ignoring invalid asset pattern");
            Some(spec)
        }
    }
}

/// Parse a multi-line component list, skipping unusable lines.
///
/// # Example
///
/// ```
/// use relsync::component::parse_component_list;
///
/// let specs = parse_component_list("cet,yamashi/CyberEngineTweaks,.\nbroken line\n");
/// assert_eq!(specs.len(), 1);
/// assert_eq!(specs[0].name, "cet");
/// ```
pub fn parse_component_list(text: &str) -> Vec<ComponentSpec> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_component_line)
        .collect()
}
