//! Arguments and setup shared by the commands that run collectors.

use super::config::Config;
use crate::Result;
use crate::store::Client;
use camino::Utf8PathBuf;
use clap::{Args, ValueEnum};
use std::io::IsTerminal;
use std::sync::Arc;

/// Color mode configuration for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Always use colors
    Always,

    /// Never use colors
    Never,

    /// Use colors if the output is a terminal, otherwise don't use colors
    Auto,
}

impl ColorMode {
    /// Resolve against whether stdout is a terminal
    #[must_use]
    pub fn use_colors(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::io::stdout().is_terminal(),
        }
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,

    /// Only error messages
    Error,

    /// Warning and error messages
    Warn,

    /// Info, warning, and error messages
    Info,

    /// Debug, info, warning, and error messages
    Debug,

    /// Trace, debug, info, warning, and error messages
    Trace,
}

/// Common arguments shared by the run commands
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Path to configuration file (default is `harvest.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// GitHub personal access token used for every API call
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// HTTP(S) proxy, overriding the configuration file
    #[arg(long, value_name = "URL", env = "SDK_HARVEST_PROXY")]
    pub proxy: Option<String>,

    /// Working directory holding the change ledger and local copies, overriding the configuration file
    #[arg(long, value_name = "PATH")]
    pub work_dir: Option<Utf8PathBuf>,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Exit with status code 1 if any collector failed
    #[arg(long)]
    pub error_if_failed: bool,
}

impl CommonArgs {
    /// Load the configuration, applying command-line overrides
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;

        if let Some(proxy) = &self.proxy {
            config.proxy = Some(proxy.clone());
        }

        if let Some(work_dir) = &self.work_dir {
            config.work_dir = Some(work_dir.clone());
        }

        config.validate()?;
        Ok(config)
    }

    /// Build the store client shared by collectors and the publisher
    pub fn client(&self, config: &Config) -> Result<Arc<Client>> {
        Ok(Arc::new(Client::new(
            self.github_token.as_deref(),
            &config.api_base_url,
            config.proxy.as_deref(),
        )?))
    }
}

/// Initialize logger based on log level
///
/// A logger installed earlier in the process is left in place.
pub fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .try_init();
}
