//! Hierarchical configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. Runtime config (~/.resilient-api/runtime.yaml)
//! 3. Explicit config file (`--config`)
//! 4. Environment variables (RESILIENT_API_* prefix)
//! 5. CLI flags (handled by caller)
//!
//! Files are merged key by key, so an overlay only needs the values it changes.

use crate::error::{Error, Result};
use crate::types::RuntimeConfig;
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde_yaml_ng::Value;
use std::env;
use std::fs;
use std::str::FromStr;

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/config/"]
#[prefix = ""]
struct EmbeddedConfigs;

const RUNTIME_DEFAULTS: &str = "runtime-defaults.yaml";
const RUNTIME_FILE: &str = "runtime.yaml";

/// Configuration hierarchy loader
#[derive(Debug, Clone)]
pub struct HierarchicalConfigLoader {
    /// Base directory for configuration files
    config_dir: Utf8PathBuf,

    /// File given on the command line, applied after the runtime file
    override_file: Option<Utf8PathBuf>,
}

impl HierarchicalConfigLoader {
    /// Create a loader rooted at `~/.resilient-api`
    pub fn new() -> Result<Self> {
        Ok(Self::with_dir(Self::default_config_dir()?))
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self {
            config_dir,
            override_file: None,
        }
    }

    /// Apply `path` on top of the runtime file; it must exist
    pub fn with_override_file(mut self, path: Utf8PathBuf) -> Self {
        self.override_file = Some(path);
        self
    }

    /// Get the standard config directory (~/.resilient-api)
    fn default_config_dir() -> Result<Utf8PathBuf> {
        let home = env::var("HOME")
            .or_else(|_| env::var("USERPROFILE"))
            .ok()
            .map(Utf8PathBuf::from)
            .or_else(|| dirs::home_dir().and_then(|p| Utf8PathBuf::from_path_buf(p).ok()))
            .ok_or_else(|| Error::invalid_config("Could not determine home directory"))?;

        Ok(home.join(".resilient-api"))
    }

    /// Load runtime configuration with hierarchical precedence
    ///
    /// The result is validated before it is returned.
    pub fn load_runtime_config(&self) -> Result<RuntimeConfig> {
        let mut merged = Self::load_embedded_yaml(RUNTIME_DEFAULTS)?;

        let runtime_path = self.config_dir.join(RUNTIME_FILE);
        if runtime_path.exists() {
            tracing::debug!("Loading runtime config from {}", runtime_path);
            merge_yaml(&mut merged, Self::load_yaml_file(&runtime_path)?);
        }

        if let Some(path) = &self.override_file {
            if !path.exists() {
                return Err(Error::config_not_found(path.as_str()));
            }
            tracing::debug!("Loading config override from {}", path);
            merge_yaml(&mut merged, Self::load_yaml_file(path)?);
        }

        let config: RuntimeConfig = serde_yaml_ng::from_value(merged)
            .map_err(|e| Error::invalid_config(format!("Failed to parse runtime config: {}", e)))?;

        let config = Self::apply_env_overrides(config)?;
        config.validate()?;
        Ok(config)
    }

    fn load_embedded_yaml(filename: &str) -> Result<Value> {
        let embedded_file = EmbeddedConfigs::get(filename)
            .ok_or_else(|| Error::embedded_defaults(filename, "not embedded"))?;

        let content = std::str::from_utf8(&embedded_file.data)
            .map_err(|e| Error::embedded_defaults(filename, e))?;

        serde_yaml_ng::from_str(content).map_err(|e| Error::embedded_defaults(filename, e))
    }

    fn load_yaml_file(path: &Utf8Path) -> Result<Value> {
        let content = fs::read_to_string(path)?;
        let value: Value = serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))?;
        // An empty file parses to null and changes nothing
        Ok(value)
    }

    /// Apply environment variable overrides to runtime config
    fn apply_env_overrides(mut config: RuntimeConfig) -> Result<RuntimeConfig> {
        if let Ok(val) = env::var("RESILIENT_API_BASE_URL") {
            config.api.base_url = val;
        }

        if let Ok(val) = env::var("RESILIENT_API_TOKEN") {
            config.api.token = Some(val).filter(|t| !t.is_empty());
        }

        if let Some(val) = env_parse("RESILIENT_API_TIMEOUT_SECS")? {
            config.api.timeout_secs = val;
        }

        // Retry policy
        if let Some(val) = env_parse("RESILIENT_API_MAX_ATTEMPTS")? {
            config.retry.max_attempts = val;
        }

        if let Some(val) = env_parse("RESILIENT_API_INITIAL_DELAY_MS")? {
            config.retry.initial_delay_ms = val;
        }

        if let Some(val) = env_parse("RESILIENT_API_MAX_DELAY_MS")? {
            config.retry.max_delay_ms = val;
        }

        // Deletion polling
        if let Some(val) = env_parse("RESILIENT_API_POLL_RETRIES")? {
            config.polling.retries = val;
        }

        if let Some(val) = env_parse("RESILIENT_API_POLL_DELAY_MS")? {
            config.polling.delay_ms = val;
        }

        if let Ok(val) = env::var("RESILIENT_API_POLL_EXHAUSTION") {
            config.polling.exhaustion = val.parse()?;
        }

        Ok(config)
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}

/// Read and parse a numeric environment variable, if set
fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>> {
    let Ok(val) = env::var(name) else {
        return Ok(None);
    };
    match val.trim().parse() {
        Ok(parsed) => Ok(Some(parsed)),
        Err(_) => Err(Error::InvalidEnvOverride {
            var: name.to_string(),
            value: val,
        }),
    }
}

/// Recursively merge `overlay` into `base`; overlay mappings win key by key
fn merge_yaml(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_yaml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
