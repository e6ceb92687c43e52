//! Error types for resilient-api-core

use thiserror::Error;

/// Result type alias using resilient-api-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Failures while resolving or checking runtime configuration
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A policy value that can never produce a usable schedule
    #[error("Invalid {field}: {reason}")]
    InvalidPolicy { field: &'static str, reason: String },

    /// An environment override that does not parse
    #[error("Environment variable {var} has invalid value '{value}'")]
    InvalidEnvOverride { var: String, value: String },

    /// Defaults compiled into the binary are missing or malformed
    #[error("Embedded defaults {name} are unusable: {reason}")]
    EmbeddedDefaults { name: String, reason: String },

    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn invalid_policy(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidPolicy {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn embedded_defaults(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::EmbeddedDefaults {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}
