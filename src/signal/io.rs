//! I/O helpers for signals and JSON reports.
//!
//! - `load_signal`: read a CSV or JSON file into a validated [`Signal`].
//! - `parse_csv_signal`: parse `position,value[,sigma]` text.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::{NoiseModel, Signal};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// On-disk JSON layout of a signal.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRecord {
    pub positions: Vec<f64>,
    pub values: Vec<f64>,
    #[serde(default)]
    pub noise: NoiseModel,
}

/// Load a signal from `.json` or CSV text (any other extension).
///
/// `noise` overrides whatever noise information the file carries. Samples
/// with a NaN position or amplitude are dropped.
pub fn load_signal(path: &Path, noise: Option<NoiseModel>) -> Result<Signal, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read signal {}: {e}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let record = if is_json {
        serde_json::from_str::<SignalRecord>(&contents)
            .map_err(|e| format!("Failed to parse signal {}: {e}", path.display()))?
    } else {
        parse_csv_signal(&contents).map_err(|e| format!("{}: {e}", path.display()))?
    };
    let noise = noise.unwrap_or(record.noise);
    Signal::from_raw(&record.positions, &record.values, noise).map_err(|e| e.to_string())
}

/// Parse comma, semicolon or whitespace separated columns.
///
/// Blank lines and `#` comments are skipped. A first line that does not parse
/// as numbers is treated as a header. When every row has a third column it
/// becomes a per-sample noise model.
pub fn parse_csv_signal(text: &str) -> Result<SignalRecord, String> {
    let mut positions = Vec::new();
    let mut values = Vec::new();
    let mut sigmas = Vec::new();
    let mut rows_with_sigma = 0usize;
    let mut seen_data = false;

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|f| !f.is_empty())
            .collect();
        let parsed: Result<Vec<f64>, _> = fields.iter().map(|f| f.parse::<f64>()).collect();
        let parsed = match parsed {
            Ok(p) => p,
            Err(_) if !seen_data => {
                seen_data = true;
                continue;
            }
            Err(e) => return Err(format!("line {}: {e}", line_no + 1)),
        };
        seen_data = true;
        if parsed.len() < 2 {
            return Err(format!(
                "line {}: expected at least 2 columns, got {}",
                line_no + 1,
                parsed.len()
            ));
        }
        positions.push(parsed[0]);
        values.push(parsed[1]);
        if let Some(&sigma) = parsed.get(2) {
            sigmas.push(sigma);
            rows_with_sigma += 1;
        }
    }

    let noise = if rows_with_sigma > 0 && rows_with_sigma == positions.len() {
        NoiseModel::PerSample(sigmas)
    } else {
        NoiseModel::Estimated
    };
    Ok(SignalRecord {
        positions,
        values,
        noise,
    })
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
