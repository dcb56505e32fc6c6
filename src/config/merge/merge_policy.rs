//! Merge rules: defaults, override order, conflict handling.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Only scalar keys are seeded here; tables such as `pipeline.fields` fall back to
/// their serde defaults so a partial table in a file still merges cleanly.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("api.base_url", "http://localhost:1337/api")?
        .set_default("api.token_env", "SALESDESK_API_TOKEN")?
        .set_default("api.connect_timeout_secs", 10)?
        .set_default("api.request_timeout_secs", 30)?
        .set_default("pipeline.confirmed_probability_code", "100")?
        .set_default("pipeline.fanout_concurrency", 1)
}
