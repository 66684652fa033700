use super::Host;
use super::common::{CommonArgs, init_logging};
use crate::Result;
use crate::collectors::github;
use crate::harvest::{Orchestrator, RegistryBuilder, RunMode, acquire_work_lock};
use crate::publish::Publisher;
use clap::Parser;
use ohno::{IntoAppError, bail};
use std::fs;
use std::io::Write;
use std::sync::Arc;

const LOG_TARGET: &str = "   harvest";

#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Parser, Debug)]
pub struct ConcurrentArgs {
    /// Number of concurrent workers (default comes from the configuration file)
    #[arg(long, short = 'w', value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Parser, Debug)]
pub struct SdkArgs {
    /// Name of the collector to run
    #[arg(value_name = "NAME")]
    pub name: String,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Parser, Debug)]
pub struct FamilyArgs {
    /// Name of the source family to run
    #[arg(value_name = "FAMILY")]
    pub family: String,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Build the registry from the configuration, run `mode`, and report the summary.
pub async fn process_harvest<H: Host>(host: &mut H, args: &CommonArgs, mode: RunMode) -> Result<()> {
    init_logging(args.log_level);

    let config = args.load_config()?;
    let mode = match mode {
        RunMode::Concurrent { workers: 0 } => RunMode::Concurrent { workers: config.workers },
        other => other,
    };

    let work_dir = config.work_dir()?;
    fs::create_dir_all(&work_dir).into_app_err_with(|| format!("creating work directory '{}'", work_dir.display()))?;
    let _lock = acquire_work_lock(&work_dir).await?;

    let client = args.client(&config)?;

    let mut builder = RegistryBuilder::new();
    github::register(&mut builder, &config.github, &client)?;
    let registry = builder.build();

    match &mode {
        RunMode::Single(name) if !registry.contains(name) => {
            bail!("no collector named '{name}'; known collectors: {}", registry.names().join(", "));
        }
        RunMode::Family(family) if !registry.has_family(family) => {
            bail!("no source family named '{family}'; known families: {}", registry.families().join(", "));
        }
        _ => {}
    }

    log::info!(
        target: LOG_TARGET,
        "Publishing to '{}' from work directory '{}'",
        config.repo,
        work_dir.display()
    );

    let publisher = Arc::new(Publisher::new(client, &config.repo, &config.remote_dir, &work_dir)?);
    let summary = Orchestrator::new(registry, publisher, config.run_settings()).run(&mode).await;

    let mut text = String::new();
    summary
        .render(&mut text, args.color.use_colors())
        .into_app_err("formatting run summary")?;
    let _ = write!(host.output(), "{text}");

    if args.error_if_failed && summary.has_failures() {
        host.exit(1);
    }

    Ok(())
}
