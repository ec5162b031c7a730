//! Release asset selection.

use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::manager::{ManagerError, ManagerResult};

/// Pattern matching any archive extension the extractor supports.
pub const GENERIC_ASSET_PATTERN: &str = r"\.(zip|tar|tar\.gz|tgz|gz|rar)$";

/// Built-in asset patterns for components whose releases ship several
/// archives (debug symbols, source bundles) next to the installable one.
const KNOWN_ASSET_PATTERNS: &[(&str, &str)] = &[
    ("yamashi/CyberEngineTweaks", r"^cet_.*\.zip$"),
    ("wopss/RED4ext", r"^red4ext_.*\.zip$"),
    ("jackhumbert/redscript", r"^redscript.*\.zip$"),
    ("psiberx/cp2077-archive-xl", r"^ArchiveXL.*\.zip$"),
    ("psiberx/cp2077-tweak-xl", r"^TweakXL.*\.zip$"),
    ("psiberx/cp2077-codeware", r"^Codeware.*\.zip$"),
];

/// Compiled, case-insensitive matcher for release asset file names.
///
/// # Example
///
/// ```
/// use relsync::component::AssetSelector;
///
/// let selector = AssetSelector::new(r"^tool-.*\.zip$").unwrap();
/// assert!(selector.matches("Tool-1.0.ZIP"));
/// assert!(!selector.matches("tool-1.0.pdb"));
/// ```
#[derive(Clone)]
pub struct AssetSelector {
    pattern: Regex,
}

impl AssetSelector {
    /// Compile a selector from a regular expression (case-insensitive).
    pub fn new(pattern: &str) -> ManagerResult<Self> {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| ManagerError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { pattern })
    }

    /// Selector matching any supported archive extension.
    pub fn generic() -> Self {
        Self::new(GENERIC_ASSET_PATTERN).expect("generic asset pattern is valid")
    }

    /// Default selector for an identifier.
    ///
    /// Known identifiers (compared case-insensitively) get their built-in
    /// pattern; anything else gets [`AssetSelector::generic`].
    pub fn default_for(identifier: &str) -> Self {
        KNOWN_ASSET_PATTERNS
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(identifier.trim()))
            .and_then(|(_, pattern)| Self::new(pattern).ok())
            .unwrap_or_else(Self::generic)
    }

    /// Whether an asset file name is selected.
    pub fn matches(&self, filename: &str) -> bool {
        self.pattern.is_match(filename)
    }

    /// The source pattern.
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}

impl fmt::Debug for AssetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AssetSelector").field(&self.as_str()).finish()
    }
}

impl PartialEq for AssetSelector {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for AssetSelector {}
