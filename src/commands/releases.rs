use super::Host;
use super::common::{LogLevel, init_logging};
use crate::Result;
use crate::collectors::github::is_repo_name;
use crate::store::{Client, DEFAULT_API_BASE_URL, MAX_RELEASE_PAGES, PaginationEnd};
use clap::Parser;
use ohno::bail;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct ReleasesArgs {
    /// Repository to list, as owner/name
    #[arg(value_name = "OWNER/REPO")]
    pub repo: String,

    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// HTTP(S) proxy
    #[arg(long, value_name = "URL", env = "SDK_HARVEST_PROXY")]
    pub proxy: Option<String>,

    /// Base URL of the GitHub REST API
    #[arg(long, value_name = "URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    /// Show at most this many releases
    #[arg(long, value_name = "N", default_value_t = 20)]
    pub limit: usize,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    pub log_level: LogLevel,
}

/// List the releases of a repository and report whether the listing was cut short.
pub async fn list_releases<H: Host>(host: &mut H, args: &ReleasesArgs) -> Result<()> {
    init_logging(args.log_level);

    if !is_repo_name(&args.repo) {
        bail!("'{}' is not of the form 'owner/name'", args.repo);
    }

    let client = Client::new(args.github_token.as_deref(), &args.api_base_url, args.proxy.as_deref())?;
    let listing = client.list_releases(&args.repo).await?;

    let mut out = host.output();
    for release in listing.items.iter().take(args.limit) {
        let marker = if release.prerelease { " (prerelease)" } else { "" };
        let _ = writeln!(out, "{}{marker}: {} asset(s)", release.tag_name, release.assets.len());
    }

    if listing.items.len() > args.limit {
        let _ = writeln!(out, "... {} more", listing.items.len() - args.limit);
    }

    let _ = match listing.end {
        PaginationEnd::Exhausted => writeln!(
            out,
            "{} release(s) in {} page(s), complete",
            listing.items.len(),
            listing.pages
        ),
        PaginationEnd::CeilingReached => writeln!(
            out,
            "{} release(s) in {} page(s), truncated at the {MAX_RELEASE_PAGES}-page ceiling",
            listing.items.len(),
            listing.pages
        ),
    };

    Ok(())
}
