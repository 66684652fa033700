//! Collector backed by the releases of a GitHub repository.

use super::platform::{guess_arch, guess_os};
use crate::Result;
use crate::harvest::{Collector, RegistryBuilder};
use crate::publish::VersionRecord;
use crate::store::{Asset, Client, ReleaseItem};
use futures::future::BoxFuture;
use ohno::{EnrichableExt, IntoAppError, bail};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const LOG_TARGET: &str = "    github";

/// Asset name suffixes that describe another asset rather than being a download of their own
const AUXILIARY_SUFFIXES: &[&str] = &[
    ".sha256",
    ".sha256sum",
    ".sha512",
    ".sha512sum",
    ".md5",
    ".asc",
    ".sig",
    ".minisig",
    ".pem",
    ".cert",
    ".sbom",
    ".spdx.json",
    ".intoto.jsonl",
];

/// One `[[github]]` table of the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GithubCollectorConfig {
    /// SDK name, used as the artifact key.
    pub name: String,

    /// Upstream repository, `owner/name`.
    pub repo: String,

    /// Home page; defaults to the repository page.
    #[serde(default)]
    pub homepage: Option<String>,

    /// Source family this collector belongs to. Family members only run in family mode
    /// or by name.
    #[serde(default)]
    pub family: Option<String>,

    #[serde(default)]
    pub include_prereleases: bool,

    /// Prefix stripped from tag names to form the version, e.g. `go` or `release-`.
    #[serde(default)]
    pub tag_prefix: Option<String>,

    /// Only assets whose name matches this regex are recorded.
    #[serde(default)]
    pub asset_pattern: Option<String>,

    /// When false, the output is always republished and its hash is not recorded.
    #[serde(default = "default_track_changes")]
    pub track_changes: bool,
}

const fn default_track_changes() -> bool {
    true
}

impl GithubCollectorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("github collector has an empty name");
        }

        if !is_repo_name(&self.repo) {
            bail!("github collector '{}': repo '{}' is not of the form 'owner/name'", self.name, self.repo);
        }

        if let Some(pattern) = &self.asset_pattern {
            let _ = Regex::new(pattern).into_app_err_with(|| format!("github collector '{}': invalid asset_pattern", self.name))?;
        }

        Ok(())
    }

    #[must_use]
    pub fn home_page(&self) -> String {
        self.homepage.clone().unwrap_or_else(|| format!("https://github.com/{}", self.repo))
    }
}

/// Returns `true` for `owner/name` with both parts non-empty.
#[must_use]
pub fn is_repo_name(repo: &str) -> bool {
    repo.split_once('/')
        .is_some_and(|(owner, name)| !owner.is_empty() && !name.is_empty() && !name.contains('/'))
}

/// Turns the releases of one upstream repository into version records.
#[derive(Debug)]
pub struct GithubReleasesCollector {
    config: GithubCollectorConfig,
    home_page: String,
    asset_filter: Option<Regex>,
    client: Arc<Client>,
    versions: Vec<VersionRecord>,
}

impl GithubReleasesCollector {
    pub fn new(config: GithubCollectorConfig, client: Arc<Client>) -> Result<Self> {
        config.validate()?;

        let asset_filter = config
            .asset_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .into_app_err_with(|| format!("compiling asset_pattern of '{}'", config.name))?;

        Ok(Self {
            home_page: config.home_page(),
            config,
            asset_filter,
            client,
            versions: Vec::new(),
        })
    }

    async fn collect(&mut self) -> Result<()> {
        let listing = self
            .client
            .list_releases(&self.config.repo)
            .await
            .map_err(|e| e.enrich_with(|| format!("collecting releases of '{}'", self.config.name)))?;

        if listing.is_truncated() {
            log::warn!(
                target: LOG_TARGET,
                "Only the newest {} release(s) of '{}' were considered",
                listing.items.len(),
                self.config.repo
            );
        }

        self.versions = listing
            .items
            .iter()
            .filter(|release| self.config.include_prereleases || !release.prerelease)
            .flat_map(|release| self.records_for(release))
            .collect();

        log::debug!(
            target: LOG_TARGET,
            "Found {} download(s) for '{}' in {} release(s)",
            self.versions.len(),
            self.config.name,
            listing.items.len()
        );

        Ok(())
    }

    fn records_for(&self, release: &ReleaseItem) -> Vec<VersionRecord> {
        let version = version_from_tag(&release.tag_name, self.config.tag_prefix.as_deref());

        release
            .assets
            .iter()
            .filter(|asset| !is_auxiliary(&asset.name))
            .filter(|asset| self.asset_filter.as_ref().is_none_or(|re| re.is_match(&asset.name)))
            .map(|asset| to_record(&version, asset, release.prerelease))
            .collect()
    }
}

impl Collector for GithubReleasesCollector {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn home_page(&self) -> &str {
        &self.home_page
    }

    fn start(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.collect())
    }

    fn versions(&self) -> &[VersionRecord] {
        &self.versions
    }

    fn track_changes(&self) -> bool {
        self.config.track_changes
    }
}

fn to_record(version: &str, asset: &Asset, prerelease: bool) -> VersionRecord {
    let mut record = VersionRecord::new(version, &asset.url);
    record.os = guess_os(&asset.name).map(str::to_string);
    record.arch = guess_arch(&asset.name).map(str::to_string);
    record.size = (asset.size > 0).then_some(asset.size);
    record.prerelease = prerelease;

    if let Some((kind, value)) = asset.digest.as_deref().and_then(|d| d.split_once(':')) {
        record.checksum_type = Some(kind.to_string());
        record.checksum = Some(value.to_string());
    }

    record
}

/// Derive a version from a tag name.
///
/// With a prefix, the prefix is stripped when present. Without one, a leading `v` directly
/// followed by a digit is stripped.
#[must_use]
pub fn version_from_tag(tag: &str, prefix: Option<&str>) -> String {
    if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
        return tag.strip_prefix(prefix).unwrap_or(tag).to_string();
    }

    match tag.strip_prefix('v') {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest.to_string(),
        _ => tag.to_string(),
    }
}

fn is_auxiliary(asset_name: &str) -> bool {
    let lower = asset_name.to_ascii_lowercase();
    AUXILIARY_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
        || lower.contains("checksums")
        || lower == "sha256sums"
        || lower == "sha256sums.txt"
}

/// Register one collector per configuration entry, each in its family if it has one.
pub fn register(builder: &mut RegistryBuilder, configs: &[GithubCollectorConfig], client: &Arc<Client>) -> Result<()> {
    for config in configs {
        let family = config.family.clone();
        let collector = Box::new(GithubReleasesCollector::new(config.clone(), Arc::clone(client))?);

        match family.as_deref() {
            Some(family) => builder.register_in_family(family, collector)?,
            None => builder.register(collector)?,
        }
    }

    Ok(())
}
