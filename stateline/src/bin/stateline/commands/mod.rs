pub mod analyze;
pub mod export;
pub mod plugins;

use anyhow::{Context, Result};
use stateline::{EngineConfig, Snapshot};
use std::fs;
use std::path::Path;

/// Read a capture file: a JSON array of snapshots.
pub fn load_snapshots(path: &Path) -> Result<Vec<Snapshot>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot file '{}'", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse snapshots from '{}'", path.display()))
}

/// Load engine configuration, falling back to defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file '{}'", path.display()))?;
    EngineConfig::from_toml_str(&text)
        .with_context(|| format!("failed to parse config file '{}'", path.display()))
}
