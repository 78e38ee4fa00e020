//! Runtime configuration for the command-line tool.
//!
//! ```json
//! {
//!   "input": "scope_trace.csv",
//!   "noise": { "constant": 0.002 },
//!   "params": { "window": { "multiplier": 4.0 } },
//!   "output": { "jsonOut": "out/report.json" }
//! }
//! ```

use crate::pipeline::IntegratorParams;
use crate::signal::NoiseModel;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    pub json_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    pub input: PathBuf,
    /// Overrides any noise information carried by the input file.
    #[serde(default)]
    pub noise: Option<NoiseModel>,
    #[serde(default)]
    pub params: IntegratorParams,
    #[serde(default)]
    pub output: OutputConfig,
}

impl RuntimeConfig {
    /// Resolve `input` relative to the directory holding the config file.
    pub fn resolve_input(&self, config_path: &Path) -> PathBuf {
        if self.input.is_absolute() {
            return self.input.clone();
        }
        config_path
            .parent()
            .map_or_else(|| self.input.clone(), |dir| dir.join(&self.input))
    }
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: RuntimeConfig = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    config
        .params
        .validate()
        .map_err(|e| format!("Invalid config {}: {e}", path.display()))?;
    Ok(config)
}
