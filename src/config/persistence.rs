//! Config file load, validation and save.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::config::types::{DaemonConfig, MAX_DURATION_SECS};

/// Reject settings the daemon cannot run with.
pub(crate) fn validate(config: &DaemonConfig) -> Result<()> {
    if !config.platform.root_path.starts_with('/') {
        bail!("platform.root_path must be absolute, got {:?}", config.platform.root_path);
    }
    let in_range = |v: f64| v.is_finite() && v > 0.0 && v <= MAX_DURATION_SECS;
    for (name, value) in [
        ("hotplug.poll_interval_secs", config.hotplug.poll_interval_secs),
        ("peers.call_timeout_secs", config.peers.call_timeout_secs),
        ("sensors.refresh_interval_secs", config.sensors.refresh_interval_secs),
    ] {
        if !in_range(value) {
            bail!("{} must be positive and at most {} seconds, got {}", name, MAX_DURATION_SECS, value);
        }
    }
    if let Err(name) = config.sensors.access_conditions() {
        bail!("sensors.conditions: unknown access condition {:?}", name);
    }
    Ok(())
}

/// Load the config at `path`, or the defaults if the file does not exist.
pub async fn load_config(path: &Path) -> Result<DaemonConfig> {
    let config = if path.exists() {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config: DaemonConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {:?}", path))?;
        info!("Loaded configuration from: {:?}", path);
        config
    } else {
        info!("Config file {:?} not found, using defaults", path);
        DaemonConfig::default()
    };

    validate(&config)?;
    Ok(config)
}

pub async fn save_config(config: &DaemonConfig, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write config {:?}", path))?;
    info!("Configuration saved to: {:?}", path);
    Ok(())
}
