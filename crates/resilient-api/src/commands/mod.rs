//! CLI command implementations

pub mod burst;
pub mod config;
pub mod scenario;
pub mod validate;

use anyhow::{Context, Result};
use camino::Utf8Path;
use resilient_api_core::contract::normalize_user;
use resilient_api_core::{Cancellation, HierarchicalConfigLoader, RuntimeConfig};
use serde_json::Value;

/// Resolve the runtime configuration, layering `--config` when given
pub(crate) fn load_config(config_file: Option<&Utf8Path>) -> Result<RuntimeConfig> {
    let mut loader = HierarchicalConfigLoader::new().context("Failed to locate config directory")?;
    if let Some(path) = config_file {
        loader = loader.with_override_file(path.to_path_buf());
    }
    let config = loader
        .load_runtime_config()
        .context("Failed to load runtime configuration")?;
    tracing::debug!(base_url = %config.api.base_url, "runtime configuration resolved");
    Ok(config)
}

/// A cancellation handle that fires on Ctrl-C
pub(crate) fn cancel_on_interrupt() -> Cancellation {
    let cancel = Cancellation::new();
    let handle = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling pending requests");
            handle.cancel();
        }
    });
    cancel
}

/// The id of a freshly created user, rendered as text
pub(crate) fn created_id(created: Option<Value>) -> Result<String> {
    let created = created.context("Create returned an empty body")?;
    normalize_user(&created)
        .id
        .filter(|id| !id.trim().is_empty())
        .with_context(|| format!("Created user has no id: {}", created))
}
