//! Runtime configuration loaded from TOML with environment overrides

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming the dlink home directory
pub const HOME_ENV: &str = "DLINK_HOME";
/// Environment variable with extra comma-separated shared prefixes
pub const SHARED_PREFIXES_ENV: &str = "DLINK_SHARED_PREFIXES";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Root holding `lib/connector`; falls back to the working directory
    pub home_dir: Option<PathBuf>,
    pub loader: LoaderConfig,
    pub compiler: CompilerConfig,
    pub logging: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Connector directory, relative to the home directory
    pub connector_dir: PathBuf,
    /// File extensions counted as loadable archives
    pub archive_extensions: Vec<String>,
    /// Prefixes resolved from the host in addition to the built-in list
    pub shared_prefixes: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            connector_dir: PathBuf::from("lib").join("connector"),
            archive_extensions: vec!["so".into(), "dylib".into(), "dll".into()],
            shared_prefixes: Vec::new(),
        }
    }
}

/// Key names used to chain stages together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageKeys {
    /// Key naming the stage a stage reads from
    pub input: String,
    /// Key naming the stage's own output
    pub output: String,
}

impl Default for StageKeys {
    fn default() -> Self {
        Self {
            input: "source_stage_ref".to_string(),
            output: "result_stage_name".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub batch_size: u32,
    pub max_commit_attempts: u32,
    pub max_retries: u32,
    pub connection_check_timeout_sec: u32,
    pub parallelism: u32,
    /// Raw field JSON paths are extracted from when a virtual table names none
    pub json_source_field: String,
    pub stage_keys: StageKeys,
    /// Where inline Hive/Hadoop config files are written; temp dir when unset
    pub staging_dir: Option<PathBuf>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_commit_attempts: 3,
            max_retries: 1,
            connection_check_timeout_sec: 30,
            parallelism: 1,
            json_source_field: "content".to_string(),
            stage_keys: StageKeys::default(),
            staging_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Filter used when `RUST_LOG` is unset
    pub filter: Option<String>,
    /// Write JSON logs to the log directory
    pub json: bool,
}

impl LinkConfig {
    /// Default location of the config file
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .context("Could not determine config directory")
            .map(|p| p.join("dlink").join("config.toml"))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse dlink config")
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default path is read if
    /// present. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None => match Self::default_path() {
                Ok(path) if path.exists() => Self::read(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config = Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid config file: {:?}", path))?;
        tracing::debug!(path = %path.display(), "loaded dlink config");
        Ok(config)
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(home) = lookup(HOME_ENV).filter(|v| !v.trim().is_empty()) {
            self.home_dir = Some(PathBuf::from(home));
        }
        if let Some(prefixes) = lookup(SHARED_PREFIXES_ENV) {
            self.loader.shared_prefixes.extend(
                prefixes
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(String::from),
            );
        }
    }

    /// The home directory, or the working directory when none is configured
    pub fn home_dir(&self) -> PathBuf {
        match &self.home_dir {
            Some(home) => home.clone(),
            None => {
                tracing::warn!(env = HOME_ENV, "home directory not configured, using working directory");
                PathBuf::from(".")
            }
        }
    }

    /// Absolute connector directory
    pub fn connector_root(&self) -> PathBuf {
        self.home_dir().join(&self.loader.connector_dir)
    }
}
