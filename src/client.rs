//! Content API client
//!
//! The pipeline depends only on [`ContentApi`]: create and update a record at a
//! collection path and get back the generated identifier. [`HttpContentClient`]
//! is the production implementation; it wraps payloads in the API's `{data: ...}`
//! envelope and attaches the bearer credential it was constructed with.

use crate::error::StepExecutionError;
use crate::types::{EntityId, Payload};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Successful write: the identifier the server assigned (or kept, for updates).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteReceipt {
    pub id: EntityId,
    #[serde(default)]
    pub body: Value,
}

impl WriteReceipt {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            body: Value::Null,
        }
    }
}

/// Narrow write contract the staged executor runs against.
#[async_trait]
pub trait ContentApi: Send + Sync {
    async fn create(&self, path: &str, payload: &Payload) -> Result<WriteReceipt, StepExecutionError>;

    async fn update(&self, path: &str, payload: &Payload) -> Result<WriteReceipt, StepExecutionError>;
}

/// Opaque bearer credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn build_http_client(connect_timeout: Duration, request_timeout: Duration) -> Result<Client, StepExecutionError> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(request_timeout)
        .build()
        .map_err(|e| StepExecutionError::local("", format!("Failed to create HTTP client: {}", e)))
}

fn map_http_error(path: &str, error: reqwest::Error) -> StepExecutionError {
    let status = error.status().map(|s| s.as_u16());
    let message = if error.is_timeout() {
        format!("Request timeout: {}", error)
    } else if error.is_connect() {
        format!("Connection error: {}", error)
    } else {
        format!("HTTP error: {}", error)
    };
    StepExecutionError::new(path, status, message)
}

/// HTTP implementation of [`ContentApi`].
pub struct HttpContentClient {
    client: Client,
    base_url: String,
    credential: Option<Credential>,
}

impl HttpContentClient {
    pub fn new(base_url: impl Into<String>, credential: Option<Credential>) -> Result<Self, StepExecutionError> {
        Self::with_timeouts(base_url, credential, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeouts(
        base_url: impl Into<String>,
        credential: Option<Credential>,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, StepExecutionError> {
        Ok(Self {
            client: build_http_client(connect_timeout, request_timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// GET a collection or member path and return the raw envelope body.
    pub async fn fetch(&self, path: &str) -> Result<Value, StepExecutionError> {
        let response = self.send(Method::GET, path, None).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| StepExecutionError::new(path, None, format!("Failed to parse response: {}", e)))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Payload>,
    ) -> Result<reqwest::Response, StepExecutionError> {
        let url = self.url(path);
        debug!(method = %method.as_str(), url = %url, "content api request");

        let mut request = self
            .client
            .request(method, &url)
            .header("Content-Type", "application/json");
        if let Some(credential) = &self.credential {
            request = request.header("Authorization", credential.bearer());
        }
        if let Some(payload) = payload {
            request = request.json(&json!({ "data": payload }));
        }

        let response = request.send().await.map_err(|e| map_http_error(path, e))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(StepExecutionError::new(path, Some(status), error_message(&error_text)));
        }
        Ok(response)
    }

    async fn write(&self, method: Method, path: &str, payload: &Payload) -> Result<WriteReceipt, StepExecutionError> {
        let response = self.send(method, path, Some(payload)).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| StepExecutionError::new(path, None, format!("Failed to parse response: {}", e)))?;
        let id = response_id(&body)
            .ok_or_else(|| StepExecutionError::new(path, None, "Response carried no identifier"))?;
        Ok(WriteReceipt { id, body })
    }
}

#[async_trait]
impl ContentApi for HttpContentClient {
    async fn create(&self, path: &str, payload: &Payload) -> Result<WriteReceipt, StepExecutionError> {
        self.write(Method::POST, path, payload).await
    }

    async fn update(&self, path: &str, payload: &Payload) -> Result<WriteReceipt, StepExecutionError> {
        self.write(Method::PUT, path, payload).await
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Identifier from `{data: {id}}`, falling back to a top-level `id`.
fn response_id(body: &Value) -> Option<EntityId> {
    body.pointer("/data/id")
        .and_then(EntityId::from_json)
        .or_else(|| body.get("id").and_then(EntityId::from_json))
}

/// Prefer the API's `{error: {message}}` text over the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}
