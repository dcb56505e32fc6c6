use crate::error::StepExecutionError;
use crate::plan::WriteStep;
use crate::types::EntityId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Succeeded,
    Failed,
    Skipped,
    /// An earlier step failed, so this one never ran.
    NotAttempted,
    Cancelled,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Succeeded => "succeeded",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
            StepStatus::NotAttempted => "not_attempted",
            StepStatus::Cancelled => "cancelled",
        }
    }
}

/// Result of one fan-out or dual-path child.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChildOutcome {
    pub index: usize,
    pub id: Option<EntityId>,
    /// Identifier of the history copy (dual-path steps only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependent_ids: Vec<EntityId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<StepExecutionError>,
}

impl ChildOutcome {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    pub fn succeeded(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepOutcome {
    pub index: usize,
    pub resource_path: String,
    pub kind: String,
    pub status: StepStatus,
    pub id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ChildOutcome>,
    pub error: Option<StepExecutionError>,
}

impl StepOutcome {
    pub fn for_step(step: &WriteStep, status: StepStatus) -> Self {
        Self {
            index: step.index,
            resource_path: step.resource_path.clone(),
            kind: step.kind.label().to_string(),
            status,
            id: None,
            children: Vec::new(),
            error: None,
        }
    }

    pub fn failed_children(&self) -> usize {
        self.children.iter().filter(|c| !c.succeeded()).count()
    }
}

/// Per-step report returned to the caller after a submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionResult {
    pub context: String,
    pub steps: Vec<StepOutcome>,
    pub root_id: Option<EntityId>,
    pub cancelled: bool,
}

impl ExecutionResult {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            steps: Vec::new(),
            root_id: None,
            cancelled: false,
        }
    }

    /// Every step either succeeded or was skipped.
    pub fn succeeded(&self) -> bool {
        !self.cancelled
            && self
                .steps
                .iter()
                .all(|s| matches!(s.status, StepStatus::Succeeded | StepStatus::Skipped))
    }

    pub fn failed_step(&self) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.status == StepStatus::Failed)
    }

    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }
}
