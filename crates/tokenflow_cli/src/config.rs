//! Configuration loading
//!
//! An explicit `--config` path must exist. Without one, `tokenflow.toml` in
//! the working directory is used when present, otherwise the defaults.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tokenflow_core::Net;
use tokenflow_engine::EngineConfig;
use tokenflow_oracle::NetPayload;

const DEFAULT_CONFIG_FILE: &str = "tokenflow.toml";

pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let path = match path {
        Some(path) => path,
        None => {
            let fallback = Path::new(DEFAULT_CONFIG_FILE);
            if !fallback.exists() {
                tracing::debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
                return Ok(EngineConfig::default());
            }
            fallback
        }
    };

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config = EngineConfig::from_toml_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    tracing::debug!("loaded config from {}", path.display());
    Ok(config)
}

/// Load a net from the oracle's JSON page format
pub fn load_net(path: &Path) -> Result<Net> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let payload: NetPayload = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse net {}", path.display()))?;
    Ok(payload.into_net())
}
