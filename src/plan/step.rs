use crate::error::ApiError;
use crate::types::Payload;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    Create,
    Update,
    Skip,
}

/// Which carried identifier a relation key reads.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IdSource {
    /// Identifier produced by step 0.
    RootId,
    /// Identifier produced by the most recent successful single-entity step.
    PreviousId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelationKey {
    pub field_name: String,
    pub source: IdSource,
}

/// A write that depends on a fan-out child's generated identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NestedWrite {
    pub resource_path: String,
    pub parent_field: String,
    pub payload: Payload,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChildWrite {
    pub payload: Payload,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependents: Vec<NestedWrite>,
}

impl ChildWrite {
    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            dependents: Vec::new(),
        }
    }
}

/// Shape of a step; the executor dispatches on this.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepKind {
    Single {
        payload: Payload,
    },
    Fanout {
        children: Vec<ChildWrite>,
    },
    /// Every child is written to `resource_path` and then copied to `history_path`.
    DualPath {
        history_path: String,
        link_field: Option<String>,
        children: Vec<Payload>,
    },
}

impl StepKind {
    pub fn is_empty(&self) -> bool {
        match self {
            StepKind::Single { payload } => payload.is_empty(),
            StepKind::Fanout { children } => children.is_empty(),
            StepKind::DualPath { children, .. } => children.is_empty(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StepKind::Single { .. } => "single",
            StepKind::Fanout { .. } => "fanout",
            StepKind::DualPath { .. } => "dual_path",
        }
    }
}

/// One planned network write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WriteStep {
    pub index: usize,
    pub action: StepAction,
    pub resource_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_key: Option<RelationKey>,
    #[serde(flatten)]
    pub kind: StepKind,
}

impl WriteStep {
    pub fn create(resource_path: impl Into<String>, payload: Payload) -> Self {
        Self::build(StepAction::Create, resource_path, StepKind::Single { payload })
    }

    pub fn update(resource_path: impl Into<String>, payload: Payload) -> Self {
        Self::build(StepAction::Update, resource_path, StepKind::Single { payload })
    }

    pub fn fanout(resource_path: impl Into<String>, children: Vec<ChildWrite>) -> Self {
        Self::build(
            StepAction::Create,
            resource_path,
            StepKind::Fanout { children },
        )
    }

    pub fn dual_path(
        live_path: impl Into<String>,
        history_path: impl Into<String>,
        link_field: Option<String>,
        children: Vec<Payload>,
    ) -> Self {
        Self::build(
            StepAction::Create,
            live_path,
            StepKind::DualPath {
                history_path: history_path.into(),
                link_field,
                children,
            },
        )
    }

    pub fn with_relation(mut self, field_name: impl Into<String>, source: IdSource) -> Self {
        self.relation_key = Some(RelationKey {
            field_name: field_name.into(),
            source,
        });
        self
    }

    fn build(action: StepAction, resource_path: impl Into<String>, kind: StepKind) -> Self {
        let action = if kind.is_empty() {
            StepAction::Skip
        } else {
            action
        };
        Self {
            index: 0,
            action,
            resource_path: resource_path.into(),
            relation_key: None,
            kind,
        }
    }
}

/// Ordered list of write steps for one submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmissionPlan {
    pub context: String,
    pub steps: Vec<WriteStep>,
}

impl SubmissionPlan {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step, assigning its index.
    pub fn push(&mut self, mut step: WriteStep) {
        step.index = self.steps.len();
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of steps that will issue requests.
    pub fn active_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.action != StepAction::Skip)
            .count()
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.context.trim().is_empty() {
            return Err(ApiError::InvalidPlan(
                "Submission plan context cannot be empty".to_string(),
            ));
        }
        if self.steps.is_empty() {
            return Err(ApiError::InvalidPlan(format!(
                "Submission plan for {} contains no steps",
                self.context
            )));
        }
        for (position, step) in self.steps.iter().enumerate() {
            if step.index != position {
                return Err(ApiError::InvalidPlan(format!(
                    "Step index mismatch: expected {}, got {}",
                    position, step.index
                )));
            }
            if step.resource_path.trim().is_empty() {
                return Err(ApiError::InvalidPlan(format!(
                    "Step {} has an empty resource path",
                    position
                )));
            }
            if (step.action == StepAction::Skip) != step.kind.is_empty() {
                return Err(ApiError::InvalidPlan(format!(
                    "Step {} must be skipped exactly when its payload is empty",
                    position
                )));
            }
            if step.action == StepAction::Update && !matches!(step.kind, StepKind::Single { .. }) {
                return Err(ApiError::InvalidPlan(format!(
                    "Step {} updates a {} step; only single steps can update",
                    position,
                    step.kind.label()
                )));
            }
            if position == 0 && step.relation_key.is_some() {
                return Err(ApiError::InvalidPlan(
                    "Step 0 cannot reference an earlier identifier".to_string(),
                ));
            }
        }
        Ok(())
    }
}
