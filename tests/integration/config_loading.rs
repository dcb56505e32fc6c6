//! Configuration files loaded from disk.

use salesdesk::config::{ConfigLoader, DeskConfig};
use salesdesk::error::ApiError;
use std::fs;
use tempfile::TempDir;

#[test]
fn explicit_file_overrides_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("desk.toml");
    fs::write(
        &path,
        r#"
[api]
base_url = "https://crm.example.test/api"
request_timeout_secs = 5

[pipeline]
fanout_concurrency = 4
confirmed_probability_code = "90"

[pipeline.fields]
checkbox_groups = { channels = "channel", regions = "region" }
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&path).unwrap();
    assert_eq!(config.api.base_url, "https://crm.example.test/api");
    assert_eq!(config.api.request_timeout_secs, 5);
    assert_eq!(config.api.connect_timeout_secs, 10);
    assert_eq!(config.pipeline.fanout_concurrency, 4);
    assert_eq!(config.pipeline.executor().fanout_concurrency(), 4);
    assert_eq!(
        config.pipeline.fields.checkbox_groups.get("regions").map(String::as_str),
        Some("region")
    );
    assert!(config.validate().is_ok());
}

#[test]
fn workspace_config_directory_is_read() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("config")).unwrap();
    fs::write(
        temp.path().join("config").join("config.toml"),
        "[pipeline]\nfanout_concurrency = 3\n",
    )
    .unwrap();

    let config = ConfigLoader::load(temp.path()).unwrap();
    assert_eq!(config.pipeline.fanout_concurrency, 3);
    assert_eq!(config.api.base_url, DeskConfig::default().api.base_url);
}

#[test]
fn invalid_values_surface_as_validation_errors() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("desk.toml");
    fs::write(
        &path,
        "[api]\nbase_url = \"\"\n\n[pipeline]\nfanout_concurrency = 0\n",
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&path).unwrap();
    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 2);
    assert!(matches!(config.ensure_valid(), Err(ApiError::ConfigError(_))));
}

#[test]
fn missing_explicit_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    assert!(ConfigLoader::load_from_file(&temp.path().join("absent.toml")).is_err());
}
