//! Command-line interface for sdk-harvest
//!
//! The `run` function parses command-line arguments with clap and routes them to one of the
//! command handlers:
//!
//! - **run**, **concurrent**, **sdk**, **family**: load the configuration, take the work
//!   directory lock, build the collector registry and drive one run of the orchestrator in
//!   the chosen mode, then print the run summary
//! - **releases**: list an upstream repository's releases, reporting whether the page
//!   ceiling cut the listing short
//! - **init**: write a default configuration file
//!
//! Configuration lives in a TOML file (`harvest.toml` by default). Secrets come from the
//! command line or the environment, never from the file.

mod common;
mod config;
mod harvest;
mod host;
mod init;
mod releases;
mod run;

pub use common::{ColorMode, CommonArgs, LogLevel};
pub use config::{Config, DEFAULT_CONFIG_FILE, DEFAULT_CONFIG_TOML};
pub use harvest::process_harvest;
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use releases::{ReleasesArgs, list_releases};
pub use run::run;
