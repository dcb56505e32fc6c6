//! Error types for the salesdesk write pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Envelope shape errors raised by the normalizer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("Malformed relation at {path}: wrapper node has neither `id` nor `attributes`")]
    EmptyWrapperNode { path: String },

    #[error("Malformed relation at {path}: expected an object node, found {found}")]
    NodeNotObject { path: String, found: String },

    #[error("Malformed relation at {path}: `attributes` must be an object, found {found}")]
    AttributesNotObject { path: String, found: String },

    #[error("Malformed response at {path}: expected a list of entries, found {found}")]
    NotAnEntryList { path: String, found: String },
}

/// Plan composition errors. These are programming or configuration errors and
/// abort before any network call is made.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompositionError {
    #[error("Unknown submission context: {0}")]
    UnknownContext(String),

    #[error("Context {0} requires a target identifier")]
    MissingTarget(String),

    #[error("Context {context} requires field `{field}`")]
    MissingField { context: String, field: String },

    #[error("Field `{field}` holds an invalid date: {value}")]
    InvalidDate { field: String, value: String },

    #[error("Field `{field}` must be a two-element date range")]
    InvalidDateRange { field: String },

    #[error("Field `{field}` has an unexpected shape: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Code book `{book}` is not loaded")]
    UnknownCodeBook { book: String },

    #[error("Code `{code}` not found in code book `{book}`")]
    UnknownCode { book: String, code: String },

    #[error("Unknown margin mode `{0}` (expected `fixed` or `percentage`)")]
    UnknownMarginMode(String),
}

/// A failed remote call. Carries the HTTP status when the server answered.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("Request to {path} failed{}: {message}", status_suffix(.status))]
pub struct StepExecutionError {
    pub path: String,
    pub status: Option<u16>,
    pub message: String,
}

impl StepExecutionError {
    pub fn new(path: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status,
            message: message.into(),
        }
    }

    /// Failure raised before any request was sent (e.g. a relation with no identifier to carry).
    pub fn local(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(path, None, message)
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" with status {s}")).unwrap_or_default()
}

/// Application-level errors surfaced by the CLI and the loaders.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Normalization failed: {0}")]
    Normalization(#[from] NormalizationError),

    #[error("Composition failed: {0}")]
    Composition(#[from] CompositionError),

    #[error("{0}")]
    StepExecution(#[from] StepExecutionError),

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::InvalidInput(err.to_string())
    }
}
