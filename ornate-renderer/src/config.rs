use std::path::{Path, PathBuf};
use std::time::Duration;

use ornate_template::{DEFAULT_PREFIX, FailurePolicy};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("directive prefix must not be empty")]
    EmptyPrefix,
}

/// Engine settings. Every field has a default, so an empty file is valid.
///
/// ```toml
/// prefix = "orn-"
/// debug = false
/// show_interval_ms = 50
/// failure_policy = "retry"
/// base_dir = "templates"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub prefix: String,
    pub debug: bool,
    pub show_interval_ms: u64,
    pub failure_policy: FailurePolicy,
    pub base_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            debug: false,
            show_interval_ms: 50,
            failure_policy: FailurePolicy::default(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(source)?;
        if config.prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn show_interval(&self) -> Duration {
        Duration::from_millis(self.show_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        assert_eq!(Config::from_toml_str("").expect("config"), Config::default());
    }

    #[test]
    fn fields_override_defaults() {
        let config = Config::from_toml_str(
            "prefix = \"x-\"\nshow_interval_ms = 10\nfailure_policy = \"sticky\"\n",
        )
        .expect("config");
        assert_eq!(config.prefix, "x-");
        assert_eq!(config.show_interval(), Duration::from_millis(10));
        assert_eq!(config.failure_policy, FailurePolicy::Sticky);
        assert!(!config.debug);
    }

    #[test]
    fn rejects_unknown_fields_and_empty_prefixes() {
        assert!(matches!(Config::from_toml_str("colour = 1"), Err(ConfigError::Parse(_))));
        assert!(matches!(Config::from_toml_str("prefix = \"\""), Err(ConfigError::EmptyPrefix)));
    }
}
