//! Construction-time configuration for tool runners.
//!
//! A [`RunnerConfig`] holds the data-representable slice of a runner's
//! construction options and can be loaded from TOML or JSON. Handlers and
//! custom error policies are code, not data, and are supplied through the
//! builder after the config is applied.

use serde::{Deserialize, Serialize};

use crate::error::ErrorPolicy;
use crate::tool::JsonMap;

/// Deserializable construction-time settings for one tool runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub return_direct: bool,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: JsonMap,
    #[serde(default)]
    pub on_error: ErrorPolicyConfig,
}

impl RunnerConfig {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(ConfigError::Toml)
    }

    /// Parse a config from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(ConfigError::Json)
    }
}

/// Data-representable error policies.
///
/// `custom` handlers are code-only and deliberately absent here; an unknown
/// policy string fails deserialization instead of being carried as an
/// unsupported value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorPolicyConfig {
    Named(PolicyName),
    Fixed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyName {
    Propagate,
    FromError,
}

impl Default for ErrorPolicyConfig {
    fn default() -> Self {
        Self::Named(PolicyName::Propagate)
    }
}

impl ErrorPolicyConfig {
    /// Convert into the runtime policy.
    pub fn into_policy(self) -> ErrorPolicy {
        match self {
            Self::Named(PolicyName::Propagate) => ErrorPolicy::Propagate,
            Self::Named(PolicyName::FromError) => ErrorPolicy::FromError,
            Self::Fixed { message } => ErrorPolicy::FixedMessage(message),
        }
    }
}

/// Errors raised while loading a [`RunnerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
}
