//! Configuration
//!
//! Layered configuration for the API connection, the write pipeline and logging.
//! Sources, lowest precedence first: built-in defaults, the global file
//! (`~/.config/salesdesk/config.toml`), the workspace `config/` directory, and
//! `SALESDESK__*` environment variables (`SALESDESK__API__BASE_URL=...`).

use crate::client::{Credential, HttpContentClient};
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::pipeline::StagedWriteExecutor;
use crate::plan::compose::DEFAULT_CONFIRMED_PROBABILITY;
use crate::plan::{FieldRules, PlanComposer};
use serde::{Deserialize, Serialize};
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeskConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Content API connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Inline bearer token. Prefer `token_env` outside local development.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,

    /// Environment variable consulted when `token` is unset.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:1337/api".to_string()
}

fn default_token_env() -> String {
    "SALESDESK_API_TOKEN".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            token_env: default_token_env(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.base_url
            ));
        }
        if self.connect_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err("timeouts must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Inline token first, then the variable named by `token_env`.
    pub fn credential(&self) -> Option<Credential> {
        self.token
            .clone()
            .or_else(|| std::env::var(&self.token_env).ok())
            .filter(|token| !token.trim().is_empty())
            .map(Credential::new)
    }

    pub fn build_client(&self) -> Result<HttpContentClient, ApiError> {
        Ok(HttpContentClient::with_timeouts(
            self.base_url.clone(),
            self.credential(),
            Duration::from_secs(self.connect_timeout_secs),
            Duration::from_secs(self.request_timeout_secs),
        )?)
    }
}

/// Plan composition and execution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Probability code forced onto confirmed sales records.
    #[serde(default = "default_confirmed_probability_code")]
    pub confirmed_probability_code: String,

    /// Children of one fan-out step allowed in flight at once.
    #[serde(default = "default_fanout_concurrency")]
    pub fanout_concurrency: usize,

    #[serde(default)]
    pub fields: FieldRules,
}

fn default_confirmed_probability_code() -> String {
    DEFAULT_CONFIRMED_PROBABILITY.to_string()
}

fn default_fanout_concurrency() -> usize {
    StagedWriteExecutor::DEFAULT_FANOUT_CONCURRENCY
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confirmed_probability_code: default_confirmed_probability_code(),
            fanout_concurrency: default_fanout_concurrency(),
            fields: FieldRules::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.confirmed_probability_code.trim().is_empty() {
            return Err("confirmed_probability_code cannot be empty".to_string());
        }
        if self.fanout_concurrency == 0 {
            return Err("fanout_concurrency must be at least 1".to_string());
        }
        self.fields.validate()
    }

    pub fn composer(&self) -> PlanComposer {
        PlanComposer::new(self.fields.clone(), self.confirmed_probability_code.clone())
    }

    pub fn executor(&self) -> StagedWriteExecutor {
        StagedWriteExecutor::with_fanout_concurrency(self.fanout_concurrency)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Api(String),
    Pipeline(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Api(msg) => write!(f, "api: {}", msg),
            ValidationError::Pipeline(msg) => write!(f, "pipeline: {}", msg),
            ValidationError::Logging(msg) => write!(f, "logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl DeskConfig {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.api.validate() {
            errors.push(ValidationError::Api(e));
        }
        if let Err(e) = self.pipeline.validate() {
            errors.push(ValidationError::Pipeline(e));
        }
        if !matches!(self.logging.format.as_str(), "json" | "text") {
            errors.push(ValidationError::Logging(format!(
                "unknown format '{}'",
                self.logging.format
            )));
        }
        if !matches!(self.logging.output.as_str(), "stdout" | "stderr" | "file") {
            errors.push(ValidationError::Logging(format!(
                "unknown output '{}'",
                self.logging.output
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold every problem into one error.
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })
    }
}
