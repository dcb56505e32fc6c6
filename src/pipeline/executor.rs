//! Staged write executor: runs a submission plan against a content API.
//! Owns step sequencing, identifier carrying and event emission; HTTP behavior stays in the client.

use crate::client::ContentApi;
use crate::error::{ApiError, StepExecutionError};
use crate::pipeline::result::{ChildOutcome, ExecutionResult, StepOutcome, StepStatus};
use crate::plan::{ChildWrite, IdSource, StepAction, StepKind, SubmissionPlan, WriteStep};
use crate::types::{EntityId, Payload};
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Identifiers threaded from step to step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarriedIds {
    /// Produced by step 0.
    pub root: Option<EntityId>,
    /// Produced by the most recent successful single-entity step.
    pub previous: Option<EntityId>,
}

impl CarriedIds {
    pub fn get(&self, source: IdSource) -> Option<&EntityId> {
        match source {
            IdSource::RootId => self.root.as_ref(),
            IdSource::PreviousId => self.previous.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum WriteMethod {
    Create,
    Update,
}

/// Executes a submission plan step by step and reports per-step outcomes.
pub struct StagedWriteExecutor {
    fanout_concurrency: usize,
}

impl Default for StagedWriteExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl StagedWriteExecutor {
    pub const DEFAULT_FANOUT_CONCURRENCY: usize = 1;

    pub fn new() -> Self {
        Self {
            fanout_concurrency: Self::DEFAULT_FANOUT_CONCURRENCY,
        }
    }

    /// Allow up to `limit` children of one fan-out step in flight. Results keep plan order.
    pub fn with_fanout_concurrency(limit: usize) -> Self {
        Self {
            fanout_concurrency: limit.max(1),
        }
    }

    pub fn fanout_concurrency(&self) -> usize {
        self.fanout_concurrency
    }

    /// Run every step in order. A failed step halts the plan; committed steps are never undone.
    ///
    /// Only an invalid plan is an `Err`; remote failures are reported in the result.
    pub async fn execute<C: ContentApi + ?Sized>(
        &self,
        api: &C,
        plan: &SubmissionPlan,
        cancel: &CancellationToken,
    ) -> Result<ExecutionResult, ApiError> {
        plan.validate()?;
        let mut result = ExecutionResult::new(plan.context.clone());
        let mut carried = CarriedIds::default();

        emit_event(
            "submission_started",
            json!({
                "context": plan.context,
                "total_steps": plan.len(),
                "active_steps": plan.active_steps(),
            }),
        );

        let mut halted = false;
        for step in &plan.steps {
            if halted {
                result
                    .steps
                    .push(StepOutcome::for_step(step, StepStatus::NotAttempted));
                continue;
            }
            if cancel.is_cancelled() {
                if !result.cancelled {
                    result.cancelled = true;
                    emit_event(
                        "submission_cancelled",
                        json!({ "context": plan.context, "step": step.index }),
                    );
                }
                result
                    .steps
                    .push(StepOutcome::for_step(step, StepStatus::Cancelled));
                continue;
            }

            let outcome = self.run_step(api, step, &mut carried).await;
            match outcome.status {
                StepStatus::Failed => {
                    halted = true;
                    emit_event(
                        "step_failed",
                        json!({
                            "context": plan.context,
                            "step": step.index,
                            "path": step.resource_path,
                            "failed_children": outcome.failed_children(),
                            "error": outcome.error.as_ref().map(|e| e.to_string()),
                        }),
                    );
                }
                StepStatus::Succeeded => emit_event(
                    "step_completed",
                    json!({
                        "context": plan.context,
                        "step": step.index,
                        "path": step.resource_path,
                        "id": outcome.id,
                        "children": outcome.children.len(),
                    }),
                ),
                _ => {}
            }
            result.steps.push(outcome);
        }

        result.root_id = carried.root.clone();
        if !result.cancelled {
            emit_event(
                "submission_completed",
                json!({
                    "context": plan.context,
                    "succeeded": result.succeeded(),
                    "root_id": result.root_id,
                    "failed_step": result.failed_step().map(|s| s.index),
                }),
            );
        }
        Ok(result)
    }

    async fn run_step<C: ContentApi + ?Sized>(
        &self,
        api: &C,
        step: &WriteStep,
        carried: &mut CarriedIds,
    ) -> StepOutcome {
        let method = match step.action {
            StepAction::Skip => {
                emit_event(
                    "step_skipped",
                    json!({ "step": step.index, "path": step.resource_path }),
                );
                return StepOutcome::for_step(step, StepStatus::Skipped);
            }
            StepAction::Create => WriteMethod::Create,
            StepAction::Update => WriteMethod::Update,
        };

        emit_event(
            "step_started",
            json!({
                "step": step.index,
                "path": step.resource_path,
                "kind": step.kind.label(),
            }),
        );
        let mut outcome = StepOutcome::for_step(step, StepStatus::Succeeded);

        let relation = match &step.relation_key {
            None => None,
            Some(key) => match carried.get(key.source) {
                Some(id) => Some((key.field_name.as_str(), id.clone())),
                None => {
                    outcome.status = StepStatus::Failed;
                    outcome.error = Some(StepExecutionError::local(
                        &step.resource_path,
                        format!(
                            "no {:?} carried for relation field `{}`",
                            key.source, key.field_name
                        ),
                    ));
                    return outcome;
                }
            },
        };
        let parent = relation.as_ref().map(|(field, id)| (*field, id));
        let path = step.resource_path.as_str();

        match &step.kind {
            StepKind::Single { payload } => {
                let mut payload = payload.clone();
                inject(&mut payload, parent);
                let response = match method {
                    WriteMethod::Create => api.create(path, &payload).await,
                    WriteMethod::Update => api.update(path, &payload).await,
                };
                match response {
                    Ok(receipt) => {
                        if step.index == 0 {
                            carried.root = Some(receipt.id.clone());
                        }
                        carried.previous = Some(receipt.id.clone());
                        outcome.id = Some(receipt.id);
                    }
                    Err(err) => {
                        outcome.status = StepStatus::Failed;
                        outcome.error = Some(err);
                    }
                }
            }
            StepKind::Fanout { children } => {
                let results = stream::iter(children.iter().enumerate())
                    .map(move |(index, child)| write_child(api, path, index, child, parent))
                    .buffered(self.fanout_concurrency)
                    .collect::<Vec<_>>()
                    .await;
                record_children(&mut outcome, results);
            }
            StepKind::DualPath {
                history_path,
                link_field,
                children,
            } => {
                let history_path = history_path.as_str();
                let link_field = link_field.as_deref();
                let results = stream::iter(children.iter().enumerate())
                    .map(move |(index, payload)| {
                        write_dual_child(api, path, history_path, link_field, index, payload, parent)
                    })
                    .buffered(self.fanout_concurrency)
                    .collect::<Vec<_>>()
                    .await;
                record_children(&mut outcome, results);
            }
        }
        outcome
    }
}

fn inject(payload: &mut Payload, parent: Option<(&str, &EntityId)>) {
    if let Some((field, id)) = parent {
        payload.insert(field.to_string(), id.to_json());
    }
}

/// Write one fan-out child, then its nested dependents with the child's identifier.
async fn write_child<C: ContentApi + ?Sized>(
    api: &C,
    path: &str,
    index: usize,
    child: &ChildWrite,
    parent: Option<(&str, &EntityId)>,
) -> ChildOutcome {
    let mut outcome = ChildOutcome::new(index);
    let mut payload = child.payload.clone();
    inject(&mut payload, parent);

    let receipt = match api.create(path, &payload).await {
        Ok(receipt) => receipt,
        Err(err) => {
            outcome.errors.push(err);
            return outcome;
        }
    };

    for dependent in &child.dependents {
        let mut nested = dependent.payload.clone();
        nested.insert(dependent.parent_field.clone(), receipt.id.to_json());
        match api.create(&dependent.resource_path, &nested).await {
            Ok(nested_receipt) => outcome.dependent_ids.push(nested_receipt.id),
            Err(err) => outcome.errors.push(err),
        }
    }
    outcome.id = Some(receipt.id);
    outcome
}

/// Write the live record, then its history copy linked back to it.
async fn write_dual_child<C: ContentApi + ?Sized>(
    api: &C,
    live_path: &str,
    history_path: &str,
    link_field: Option<&str>,
    index: usize,
    payload: &Payload,
    parent: Option<(&str, &EntityId)>,
) -> ChildOutcome {
    let mut outcome = ChildOutcome::new(index);
    let mut live = payload.clone();
    inject(&mut live, parent);

    let receipt = match api.create(live_path, &live).await {
        Ok(receipt) => receipt,
        Err(err) => {
            outcome.errors.push(err);
            return outcome;
        }
    };

    let mut history = live;
    if let Some(field) = link_field {
        history.insert(field.to_string(), receipt.id.to_json());
    }
    match api.create(history_path, &history).await {
        Ok(history_receipt) => outcome.history_id = Some(history_receipt.id),
        Err(err) => outcome.errors.push(err),
    }
    outcome.id = Some(receipt.id);
    outcome
}

fn record_children(outcome: &mut StepOutcome, children: Vec<ChildOutcome>) {
    for child in children.iter().filter(|c| !c.succeeded()) {
        emit_event(
            "child_failed",
            json!({
                "step": outcome.index,
                "path": outcome.resource_path,
                "child": child.index,
                "errors": child.errors.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
            }),
        );
    }
    if let Some(first) = children.iter().find_map(|c| c.errors.first()) {
        outcome.status = StepStatus::Failed;
        outcome.error = Some(first.clone());
    }
    outcome.children = children;
}

fn emit_event(event_type: &'static str, payload: Value) {
    match event_type {
        "step_failed" | "child_failed" | "submission_cancelled" => {
            warn!(event = event_type, %payload, "submission event")
        }
        _ => info!(event = event_type, %payload, "submission event"),
    }
}
