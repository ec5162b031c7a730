//! GitHub release lookup.
//!
//! Queries `GET /repos/{owner}/{repo}/releases/latest` and turns the
//! response into a [`ReleaseInfo`]:
//!
//! 1. Tag = `tag_name`, else `name`, normalized (trimmed, leading `v` removed)
//! 2. Assets whose file name matches the component's selector are kept
//! 3. With no match, the release's source snapshot (`zipball_url`) is used
//!
//! Every failure is logged and reported as [`ReleaseInfo::none`].

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::component::AssetSelector;
use crate::version::normalize;

use super::error::{ManagerError, ManagerResult};
use super::traits::{ReleaseAsset, ReleaseInfo, ReleaseResolver};

/// Default GitHub REST API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default timeout for release lookups.
pub const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 15;

/// User agent sent with every request (GitHub rejects requests without one).
pub(crate) const CLIENT_USER_AGENT: &str = concat!("relsync/", env!("CARGO_PKG_VERSION"));

/// Subset of the GitHub release payload the resolver consumes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleasePayload {
    #[serde(default)]
    pub tag_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub assets: Vec<AssetPayload>,
    #[serde(default)]
    pub zipball_url: Option<String>,
}

/// One entry of a release's `assets` array.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetPayload {
    pub name: String,
    pub browser_download_url: String,
    /// `sha256:<hex>` on releases published since GitHub started exposing
    /// asset digests.
    #[serde(default)]
    pub digest: Option<String>,
}

/// Release resolver backed by the GitHub REST API.
#[derive(Debug)]
pub struct GitHubResolver {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubResolver {
    /// Create a resolver for the public GitHub API with default timeout.
    pub fn new(token: Option<String>) -> ManagerResult<Self> {
        Self::with_settings(
            DEFAULT_API_URL,
            token,
            Duration::from_secs(DEFAULT_LOOKUP_TIMEOUT_SECS),
        )
    }

    /// Create a resolver with a custom API base URL and timeout.
    pub fn with_settings(
        api_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> ManagerResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ManagerError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// URL of the latest-release endpoint for an identifier.
    pub fn latest_release_url(&self, identifier: &str) -> String {
        format!(
            "{}/repos/{}/releases/latest",
            self.api_url,
            identifier.trim().trim_matches('/')
        )
    }

    fn fetch_latest(&self, identifier: &str) -> Result<ReleasePayload, String> {
        let url = self.latest_release_url(identifier);
        let mut request = self
            .client
            .get(&url)
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, CLIENT_USER_AGENT);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request.send().map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("GET {} returned status {}", url, status));
        }

        response
            .json::<ReleasePayload>()
            .map_err(|e| format!("malformed release payload: {}", e))
    }
}

impl ReleaseResolver for GitHubResolver {
    fn resolve(&self, identifier: &str, selector: &AssetSelector) -> ReleaseInfo {
        match self.fetch_latest(identifier) {
            Ok(payload) => {
                let info = select_release(identifier, &payload, selector);
                debug!(
                    identifier,
                    tag = ?info.tag,
                    assets = info.assets.len(),
                    "Resolved latest release"
                );
                info
            }
            Err(reason) => {
                warn!(identifier, %reason, "Release lookup failed");
                ReleaseInfo::none()
            }
        }
    }
}

/// Apply the selection rules to a release payload.
///
/// # Example
///
/// ```
/// use relsync::component::AssetSelector;
/// use relsync::manager::{select_release, ReleasePayload};
///
/// let payload: ReleasePayload = serde_json::from_str(
///     r#"{"tag_name": "v2.1.0", "assets": [
///         {"name": "tool-2.1.0.zip", "browser_download_url": "https://example.com/t.zip"}
///     ]}"#,
/// ).unwrap();
///
/// let info = select_release("owner/tool", &payload, &AssetSelector::generic());
/// assert_eq!(info.tag.as_deref(), Some("2.1.0"));
/// assert_eq!(info.assets.len(), 1);
/// ```
pub fn select_release(
    identifier: &str,
    payload: &ReleasePayload,
    selector: &AssetSelector,
) -> ReleaseInfo {
    let tag = payload
        .tag_name
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .or(payload.name.as_deref())
        .map(normalize)
        .filter(|t| !t.is_empty());

    let mut assets: Vec<ReleaseAsset> = payload
        .assets
        .iter()
        .filter(|asset| selector.matches(&asset.name))
        .map(|asset| ReleaseAsset {
            name: asset.name.clone(),
            url: asset.browser_download_url.clone(),
            sha256: asset.digest.as_deref().and_then(parse_sha256_digest),
        })
        .collect();

    if assets.is_empty() {
        if let (Some(url), Some(tag)) = (payload.zipball_url.as_deref(), tag.as_deref()) {
            assets.push(ReleaseAsset::new(snapshot_name(identifier, tag), url));
        }
    }

    ReleaseInfo { tag, assets }
}

/// File name given to a release's source snapshot.
fn snapshot_name(identifier: &str, tag: &str) -> String {
    let repo = identifier
        .trim()
        .trim_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(identifier);
    format!("{}-{}-source.zip", repo, tag)
}

/// Extract the hex part of a `sha256:<hex>` digest string.
fn parse_sha256_digest(digest: &str) -> Option<String> {
    let hex = digest.trim().strip_prefix("sha256:")?;
    if hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(hex.to_ascii_lowercase())
    } else {
        None
    }
}
