//! Seams between the synchronization pipeline and the network.
//!
//! The [`Synchronizer`](super::Synchronizer) only talks to the release host
//! through these traits, so tests can drive the full pipeline with local
//! fixtures.

use std::path::Path;

use crate::component::AssetSelector;

use super::error::ManagerResult;

/// A downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseAsset {
    /// File name as published (used for format detection).
    pub name: String,
    /// Download URL.
    pub url: String,
    /// Lowercase hex SHA-256 digest, when the host publishes one.
    pub sha256: Option<String>,
}

impl ReleaseAsset {
    /// Create an asset without a known digest.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            sha256: None,
        }
    }

    /// Attach a SHA-256 digest.
    pub fn with_sha256(mut self, digest: impl Into<String>) -> Self {
        self.sha256 = Some(digest.into());
        self
    }
}

/// Result of a release lookup.
///
/// A missing tag or an empty asset list both mean "no usable release".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// Normalized version tag.
    pub tag: Option<String>,
    /// Selected assets, in publication order.
    pub assets: Vec<ReleaseAsset>,
}

impl ReleaseInfo {
    /// A lookup that found nothing usable.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether the pipeline can proceed with this release.
    pub fn is_usable(&self) -> bool {
        self.tag.as_deref().is_some_and(|t| !t.is_empty()) && !self.assets.is_empty()
    }
}

/// Looks up the latest release of a component.
///
/// Implementations report failures as [`ReleaseInfo::none`] instead of
/// returning errors; a failed lookup is a per-cycle condition.
pub trait ReleaseResolver {
    /// Resolve the latest release, keeping assets matched by `selector`.
    fn resolve(&self, identifier: &str, selector: &AssetSelector) -> ReleaseInfo;
}

/// Fetches a URL into a local file.
pub trait ArchiveDownloader {
    /// Download `url` to `dest`, returning the number of bytes written.
    fn download(&self, url: &str, dest: &Path) -> ManagerResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_info_usable() {
        let info = ReleaseInfo {
            tag: Some("1.0".to_string()),
            assets: vec![ReleaseAsset::new("tool.zip", "https://example.com/tool.zip")],
        };
        assert!(info.is_usable());
    }

    #[test]
    fn test_release_info_requires_tag_and_assets() {
        assert!(!ReleaseInfo::none().is_usable());

        let no_assets = ReleaseInfo {
            tag: Some("1.0".to_string()),
            assets: Vec::new(),
        };
        assert!(!no_assets.is_usable());

        let empty_tag = ReleaseInfo {
            tag: Some(String::new()),
            assets: vec![ReleaseAsset::new("tool.zip", "u")],
        };
        assert!(!empty_tag.is_usable());
    }

    #[test]
    fn test_asset_with_digest() {
        let asset = ReleaseAsset::new("a.zip", "u").with_sha256("abc");
        assert_eq!(asset.sha256.as_deref(), Some("abc"));
    }
}
