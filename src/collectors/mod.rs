//! Built-in collectors
//!
//! Site-specific collectors plug in through [`crate::harvest::Collector`]. The ones here are
//! generic and driven entirely by the configuration file.

pub mod github;
mod platform;

pub use github::{GithubCollectorConfig, GithubReleasesCollector};
pub use platform::{guess_arch, guess_os};
