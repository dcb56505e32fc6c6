//! Shared presentation helpers.

use crate::config::DeskConfig;
use crate::error::ApiError;
use serde::Serialize;
use serde_json::Value;

pub(crate) fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value).map_err(ApiError::from)
}

/// One-line rendering of a JSON value for table cells.
pub(crate) fn cell(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn format_config(config: &DeskConfig, format: &str) -> Result<String, ApiError> {
    match format {
        "json" => to_pretty_json(config),
        "toml" => toml::to_string_pretty(config)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render configuration: {}", e))),
        other => Err(ApiError::InvalidInput(format!(
            "Unknown format '{}' (expected toml or json)",
            other
        ))),
    }
}
