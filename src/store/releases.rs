use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A downloadable file attached to a release
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    #[serde(rename = "browser_download_url")]
    pub url: String,
    #[serde(default)]
    pub size: u64,
    /// Content digest reported by the host, e.g. `sha256:<hex>`
    #[serde(default)]
    pub digest: Option<String>,
}

/// Minimal GitHub release info with only the fields we need
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseItem {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// Why a paginated release listing stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationEnd {
    /// The source returned an empty page; the listing is complete.
    Exhausted,

    /// The page ceiling was hit; older releases were not fetched.
    CeilingReached,
}

/// Releases of one repository, newest first, as returned by the releases endpoint
#[derive(Debug, Clone)]
pub struct ReleaseListing {
    pub items: Vec<ReleaseItem>,
    pub pages: u32,
    pub end: PaginationEnd,
}

impl ReleaseListing {
    /// Returns `true` if the repository may have more releases than were listed.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.end == PaginationEnd::CeilingReached
    }
}
