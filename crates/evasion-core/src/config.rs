//! Configuration loading for the evasion controller.
//!
//! Settings can be built in code or loaded from a TOML file. Missing sections
//! and keys fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::sampling::{SampleRegion, DEFAULT_MAX_ATTEMPTS};

/// Complete evasion configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EvasionConfig {
    /// When to flee and how fast
    #[serde(default)]
    pub avoidance: AvoidanceConfig,
    /// Escape point sampling settings
    #[serde(default)]
    pub sampling: SamplingConfig,
}

impl EvasionConfig {
    /// Loads and validates configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes this configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Rejects values the controller cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |field: &'static str, value: f32| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be positive and finite, got {value}"),
                })
            }
        };

        positive("avoidance.avoid_range", self.avoidance.avoid_range)?;
        positive("sampling.region_size", self.sampling.region_size)?;
        positive("sampling.min_spacing", self.sampling.min_spacing)?;

        if !(self.avoidance.travel_speed.is_finite() && self.avoidance.travel_speed >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "avoidance.travel_speed",
                reason: format!(
                    "must be non-negative and finite, got {}",
                    self.avoidance.travel_speed
                ),
            });
        }
        if let Err(e) = self.sampling.region().validate() {
            return Err(ConfigError::Invalid {
                field: "sampling",
                reason: e.to_string(),
            });
        }
        if self.sampling.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "sampling.max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Flee trigger and movement settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvoidanceConfig {
    /// Threat distance below which the agent evades
    pub avoid_range: f32,
    /// Speed handed to the movement executor with each destination
    pub travel_speed: f32,
}

impl Default for AvoidanceConfig {
    fn default() -> Self {
        Self {
            avoid_range: 10.0,
            travel_speed: 3.5,
        }
    }
}

/// Escape point sampling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Side length of the square region sampled around the agent
    pub region_size: f32,
    /// Minimum distance between sampled points
    pub min_spacing: f32,
    /// Placement attempts per active point
    pub max_attempts: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            region_size: 20.0,
            min_spacing: 1.0,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl SamplingConfig {
    pub fn region(&self) -> SampleRegion {
        SampleRegion::square(self.region_size, self.min_spacing)
    }
}

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Generates a default configuration file content.
pub fn default_config_toml() -> String {
    r#"# Evasion Configuration

[avoidance]
avoid_range = 10.0
travel_speed = 3.5

[sampling]
region_size = 20.0
min_spacing = 1.0
max_attempts = 30
"#
    .to_string()
}
