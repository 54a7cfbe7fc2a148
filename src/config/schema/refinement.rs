use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::core::refinement::types::{ContentType, StrategyType};
use crate::error::ConfigError;
use crate::providers::GenerationOptions;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinementConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default)]
    pub max_length: MaxLengthConfig,
    /// Upper bound on parallel variations per alternatives call.
    #[serde(default = "default_max_alternatives")]
    pub max_alternatives: usize,
    /// Temperature added per rank when generating alternatives.
    #[serde(default = "default_alternative_temperature_step")]
    pub alternative_temperature_step: f64,
    /// Seeds for the strategy success-probability table, keyed by strategy name.
    #[serde(default)]
    pub success_probabilities: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxLengthConfig {
    #[serde(default = "default_blog_length")]
    pub blog: usize,
    #[serde(default = "default_email_length")]
    pub email: usize,
    #[serde(default = "default_social_length")]
    pub social: usize,
}

fn default_temperature() -> f64 {
    0.7
}
fn default_max_alternatives() -> usize {
    3
}
fn default_alternative_temperature_step() -> f64 {
    0.1
}
fn default_blog_length() -> usize {
    2000
}
fn default_email_length() -> usize {
    800
}
fn default_social_length() -> usize {
    280
}

impl Default for MaxLengthConfig {
    fn default() -> Self {
        Self {
            blog: default_blog_length(),
            email: default_email_length(),
            social: default_social_length(),
        }
    }
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_length: MaxLengthConfig::default(),
            max_alternatives: default_max_alternatives(),
            alternative_temperature_step: default_alternative_temperature_step(),
            success_probabilities: BTreeMap::new(),
        }
    }
}

impl RefinementConfig {
    pub fn max_length_for(&self, content_type: ContentType) -> usize {
        match content_type {
            ContentType::Blog => self.max_length.blog,
            ContentType::Email => self.max_length.email,
            ContentType::Social => self.max_length.social,
        }
    }

    /// Options for the `rank`-th variation (0 = primary).
    pub fn options_for(&self, content_type: ContentType, rank: usize) -> GenerationOptions {
        let bump = self.alternative_temperature_step * f64::from(u32::try_from(rank).unwrap_or(u32::MAX));
        GenerationOptions {
            temperature: (self.temperature + bump).min(2.0),
            max_length: self.max_length_for(content_type),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Validation(format!(
                "refinement.temperature must be within [0.0, 2.0], got {}",
                self.temperature
            )));
        }
        if self.max_alternatives == 0 {
            return Err(ConfigError::Validation(
                "refinement.max_alternatives must be >= 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.alternative_temperature_step) {
            return Err(ConfigError::Validation(
                "refinement.alternative_temperature_step must be within [0.0, 1.0]".into(),
            ));
        }
        let lengths = [
            ("blog", self.max_length.blog),
            ("email", self.max_length.email),
            ("social", self.max_length.social),
        ];
        if let Some((name, _)) = lengths.iter().find(|(_, length)| *length == 0) {
            return Err(ConfigError::Validation(format!(
                "refinement.max_length.{name} must be > 0"
            )));
        }
        self.strategy_overrides().map(|_| ())
    }

    /// Parsed success-probability seeds.
    pub fn strategy_overrides(&self) -> Result<BTreeMap<StrategyType, f64>, ConfigError> {
        let mut overrides = BTreeMap::new();
        for (name, probability) in &self.success_probabilities {
            let kind = StrategyType::from_str(name).map_err(|_| {
                ConfigError::Validation(format!(
                    "refinement.success_probabilities: unknown strategy '{name}'"
                ))
            })?;
            if !(0.0..=1.0).contains(probability) {
                return Err(ConfigError::Validation(format!(
                    "refinement.success_probabilities.{name} must be within [0.0, 1.0], got {probability}"
                )));
            }
            overrides.insert(kind, *probability);
        }
        Ok(overrides)
    }
}
