use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming a YAML config file.
pub const CONFIG_ENV: &str = "SCRIPTSHIM_CONFIG";

const DEFAULT_LOG_FILTER: &str = "info";
const DEFAULT_RUNTIME_FILENAME: &str = "scriptshim-runtime.js";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read shim config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unable to determine config directory")]
    ConfigDir,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShimConfig {
    /// QuickJS heap limit in bytes.
    pub memory_limit: Option<usize>,
    /// QuickJS stack limit in bytes.
    pub max_stack_size: Option<usize>,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Source URL the script runtime is evaluated under.
    pub runtime_filename: String,
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            memory_limit: None,
            max_stack_size: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            runtime_filename: DEFAULT_RUNTIME_FILENAME.to_string(),
        }
    }
}

impl ShimConfig {
    /// Read `config_path` if it names an existing file, defaults otherwise.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) if path.exists() => {
                let contents = fs::read_to_string(path)?;
                Ok(serde_yaml::from_str(&contents)?)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Load from `$SCRIPTSHIM_CONFIG`, falling back to [`Self::default_path`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = match std::env::var(CONFIG_ENV) {
            Ok(path) => PathBuf::from(path),
            Err(_) => Self::default_path()?,
        };
        Self::load(Some(path))
    }

    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dirs =
            ProjectDirs::from("org", "ScriptShim", "scriptshim").ok_or(ConfigError::ConfigDir)?;
        Ok(dirs.config_dir().join("config.yaml"))
    }
}
