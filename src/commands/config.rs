use crate::Result;
use crate::collectors::GithubCollectorConfig;
use crate::collectors::github::is_repo_name;
use crate::harvest::{DEFAULT_QUEUE_CAPACITY, RunSettings};
use crate::store::DEFAULT_API_BASE_URL;
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use directories::BaseDirs;
use ohno::{IntoAppError, app_err, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::PathBuf;
use url::Url;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Configuration file looked up in the current directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "harvest.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Remote store repository, `owner/name`
    pub repo: String,

    /// Directory inside the remote repository receiving published files
    #[serde(default)]
    pub remote_dir: String,

    /// Local working directory; the platform cache directory when absent
    #[serde(default)]
    pub work_dir: Option<Utf8PathBuf>,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default = "default_sequential_delay_secs")]
    pub sequential_delay_secs: u64,

    #[serde(default)]
    pub proxy: Option<String>,

    /// Collectors backed by GitHub releases
    #[serde(default)]
    pub github: Vec<GithubCollectorConfig>,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

const fn default_workers() -> usize {
    1
}

const fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

const fn default_sequential_delay_secs() -> u64 {
    6
}

impl Config {
    /// Load configuration from `config_path`, or from `harvest.toml` in the current directory
    pub fn load(config_path: Option<&Utf8Path>) -> Result<Self> {
        let path = config_path.unwrap_or_else(|| Utf8Path::new(DEFAULT_CONFIG_FILE));

        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound && config_path.is_none() => {
                bail!("no configuration file found at '{path}'; run `sdk-harvest init` to create one");
            }
            Err(e) => return Err(e).into_app_err_with(|| format!("reading configuration file '{path}'")),
        };

        Self::parse(&text).map_err(|e| app_err!("parsing configuration file '{path}': {e:#}"))
    }

    /// Parse and validate configuration text
    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).into_app_err("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Save the default configuration to a TOML file
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !is_repo_name(&self.repo) {
            bail!("repo must be of the form 'owner/name', got '{}'", self.repo);
        }

        let api = Url::parse(&self.api_base_url).into_app_err_with(|| format!("api_base_url '{}' is not a valid URL", self.api_base_url))?;
        if !matches!(api.scheme(), "http" | "https") {
            bail!("api_base_url must use http or https, got '{}'", self.api_base_url);
        }

        if let Some(proxy) = &self.proxy {
            let _ = Url::parse(proxy).into_app_err_with(|| format!("proxy '{proxy}' is not a valid URL"))?;
        }

        if self.workers == 0 {
            bail!("workers must be at least 1");
        }

        if self.queue_capacity == 0 {
            bail!("queue_capacity must be at least 1");
        }

        if self.remote_dir.split('/').any(|part| part == "..") {
            bail!("remote_dir must not contain '..', got '{}'", self.remote_dir);
        }

        let mut names = HashSet::new();
        for collector in &self.github {
            collector.validate()?;
            if !names.insert(collector.name.as_str()) {
                bail!("collector '{}' is declared more than once", collector.name);
            }
        }

        Ok(())
    }

    /// Resolve the working directory, falling back to the platform cache directory
    pub fn work_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.work_dir {
            return Ok(dir.as_std_path().to_path_buf());
        }

        Ok(BaseDirs::new()
            .into_app_err("could not determine cache directory")?
            .cache_dir()
            .join("sdk-harvest"))
    }

    #[must_use]
    pub const fn run_settings(&self) -> RunSettings {
        RunSettings {
            queue_capacity: self.queue_capacity,
            sequential_delay: Duration::from_secs(self.sequential_delay_secs),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}
