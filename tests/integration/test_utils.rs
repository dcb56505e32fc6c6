//! Shared test utilities: JSON helpers and a recording content API.

use async_trait::async_trait;
use parking_lot::Mutex;
use salesdesk::client::{ContentApi, WriteReceipt};
use salesdesk::error::StepExecutionError;
use salesdesk::types::Payload;
use serde_json::Value;

pub fn payload(value: Value) -> Payload {
    value
        .as_object()
        .cloned()
        .expect("test payload must be a JSON object")
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub payload: Payload,
}

/// In-memory content API: sequential ids for creates, echoes the member id for updates.
/// Any call whose path is listed in `rejected_paths` fails with status 422.
pub struct RecordingApi {
    next_id: Mutex<i64>,
    calls: Mutex<Vec<RecordedCall>>,
    rejected_paths: Vec<String>,
}

impl RecordingApi {
    pub fn new(first_id: i64) -> Self {
        Self {
            next_id: Mutex::new(first_id),
            calls: Mutex::new(Vec::new()),
            rejected_paths: Vec::new(),
        }
    }

    pub fn rejecting(mut self, path: &str) -> Self {
        self.rejected_paths.push(path.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.path == path)
            .cloned()
            .collect()
    }

    fn record(&self, method: &'static str, path: &str, payload: &Payload) -> Result<(), StepExecutionError> {
        self.calls.lock().push(RecordedCall {
            method,
            path: path.to_string(),
            payload: payload.clone(),
        });
        if self.rejected_paths.iter().any(|p| p == path) {
            return Err(StepExecutionError::new(path, Some(422), "rejected by test"));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentApi for RecordingApi {
    async fn create(&self, path: &str, payload: &Payload) -> Result<WriteReceipt, StepExecutionError> {
        self.record("POST", path, payload)?;
        let mut next = self.next_id.lock();
        let id = *next;
        *next += 1;
        Ok(WriteReceipt::new(id))
    }

    async fn update(&self, path: &str, payload: &Payload) -> Result<WriteReceipt, StepExecutionError> {
        self.record("PUT", path, payload)?;
        Ok(WriteReceipt::new(path.rsplit('/').next().unwrap_or_default()))
    }
}
