use super::super::{ObservabilityConfig, RefinementConfig};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub refinement: RefinementConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            log_level: default_log_level(),
            refinement: RefinementConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_level.trim().parse::<tracing::Level>().is_err() {
            return Err(ConfigError::Validation(format!(
                "log_level must be one of trace, debug, info, warn, error; got '{}'",
                self.log_level
            )));
        }
        self.refinement.validate()
    }
}
