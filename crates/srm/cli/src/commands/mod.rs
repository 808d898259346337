//! CLI command implementations

pub mod assess;
pub mod log;
pub mod parse;
pub mod rule_sets;
pub mod seed;

use crate::error::CliResult;
use serde_json::Value;
use std::path::Path;

/// Read a JSON or YAML document, chosen by file extension.
pub(crate) fn read_document(path: &Path) -> CliResult<Value> {
    let contents = std::fs::read_to_string(path)?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        Ok(serde_yaml::from_str(&contents)?)
    } else {
        Ok(serde_json::from_str(&contents)?)
    }
}
