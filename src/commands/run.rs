//! Command dispatch logic for sdk-harvest

use super::harvest::{ConcurrentArgs, FamilyArgs, RunArgs, SdkArgs, process_harvest};
use super::{InitArgs, ReleasesArgs, init_config, list_releases};
use crate::harvest::RunMode;
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "sdk-harvest", version, author, long_about = None)]
#[command(about = "Collect SDK release metadata and publish it to a GitHub repository")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: HarvestSubcommand,
}

#[derive(Subcommand, Debug)]
enum HarvestSubcommand {
    /// Run every collector, one at a time, pausing between them
    Run(Box<RunArgs>),
    /// Run every collector through a bounded queue and a pool of workers
    Concurrent(Box<ConcurrentArgs>),
    /// Run a single collector by name
    Sdk(Box<SdkArgs>),
    /// Run every collector of one source family, one at a time
    Family(Box<FamilyArgs>),
    /// List the releases of a GitHub repository
    Releases(ReleasesArgs),
    /// Generate a default configuration file
    Init(InitArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    match Cli::parse_from(args).command {
        HarvestSubcommand::Run(args) => process_harvest(host, &args.common, RunMode::Sequential).await,
        HarvestSubcommand::Concurrent(args) => {
            // zero defers to the configured worker count
            let workers = args.workers.map_or(0, usize::from);
            process_harvest(host, &args.common, RunMode::Concurrent { workers }).await
        }
        HarvestSubcommand::Sdk(args) => process_harvest(host, &args.common, RunMode::Single(args.name.clone())).await,
        HarvestSubcommand::Family(args) => process_harvest(host, &args.common, RunMode::Family(args.family.clone())).await,
        HarvestSubcommand::Releases(args) => list_releases(host, &args).await,
        HarvestSubcommand::Init(args) => init_config(host, &args),
    }
}
