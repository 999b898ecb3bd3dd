//! Controller configuration for simulation runs.

use anyhow::Context;
use flyover_core::FlyoverConfig;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable consulted when no `--config` flag is given.
pub const CONFIG_ENV: &str = "FLYOVER_CONFIG";

/// Parse and validate a JSON config. Missing fields take their defaults.
pub fn parse_config(text: &str) -> anyhow::Result<FlyoverConfig> {
    let config: FlyoverConfig = serde_json::from_str(text).context("invalid config JSON")?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &Path) -> anyhow::Result<FlyoverConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&text).with_context(|| format!("in {}", path.display()))
}

/// Explicit path, else `FLYOVER_CONFIG`, else defaults.
pub fn resolve_config(explicit: Option<&Path>) -> anyhow::Result<FlyoverConfig> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));
    match path {
        Some(path) => {
            tracing::info!("Loading config from {}", path.display());
            load_config(&path)
        }
        None => Ok(FlyoverConfig::default()),
    }
}
