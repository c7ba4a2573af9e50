//! Engine configuration.
//!
//! Per Iron Lotus Framework: Configuration is validated at load time (Poka-Yoke),
//! with sensible defaults and clear error messages. Every field has a default,
//! so an engine works without any file at all.

use serde::{Deserialize, Serialize};

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Creates a validation error.
    #[must_use]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Stub engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine name attached to log events.
    #[serde(default = "default_label")]
    pub label: String,

    /// Call recording settings.
    #[serde(default)]
    pub spy: SpyConfig,
}

fn default_label() -> String {
    "stubwork".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            label: default_label(),
            spy: SpyConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Creates a default configuration with the given label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns an error if the label is empty or contains characters other
    /// than alphanumerics, hyphens and underscores.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.label.is_empty() {
            return Err(ConfigError::invalid("label cannot be empty"));
        }
        if !self
            .label
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::invalid(
                "label must contain only alphanumeric characters, hyphens, and underscores",
            ));
        }
        Ok(())
    }

    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    /// Returns an error if the text cannot be parsed or fails validation.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }
}

/// Call recording settings for the default double provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpyConfig {
    /// Keep each invocation's arguments. When false only counts are kept.
    #[serde(default = "default_record_args")]
    pub record_args: bool,

    /// Retain only the most recent N argument lists; 0 keeps all.
    #[serde(default)]
    pub history_limit: usize,
}

fn default_record_args() -> bool {
    true
}

impl Default for SpyConfig {
    fn default() -> Self {
        Self {
            record_args: default_record_args(),
            history_limit: 0,
        }
    }
}
