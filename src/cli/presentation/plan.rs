//! Submission plan output.

use super::shared::to_pretty_json;
use crate::error::ApiError;
use crate::plan::{IdSource, StepAction, StepKind, SubmissionPlan, WriteStep};
use comfy_table::Table;

pub fn format_plan_json(plan: &SubmissionPlan) -> Result<String, ApiError> {
    to_pretty_json(plan)
}

pub fn format_plan_text(plan: &SubmissionPlan) -> String {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["#", "Action", "Kind", "Path", "Relation", "Writes"]);
    for step in &plan.steps {
        table.add_row(vec![
            step.index.to_string(),
            action_label(step.action).to_string(),
            step.kind.label().to_string(),
            step.resource_path.clone(),
            relation_label(step),
            writes_label(&step.kind),
        ]);
    }
    format!(
        "Plan for {} ({} steps, {} active)\n{}",
        plan.context,
        plan.len(),
        plan.active_steps(),
        table
    )
}

fn action_label(action: StepAction) -> &'static str {
    match action {
        StepAction::Create => "create",
        StepAction::Update => "update",
        StepAction::Skip => "skip",
    }
}

fn relation_label(step: &WriteStep) -> String {
    match &step.relation_key {
        None => "-".to_string(),
        Some(key) => {
            let source = match key.source {
                IdSource::RootId => "root",
                IdSource::PreviousId => "previous",
            };
            format!("{} <- {}", key.field_name, source)
        }
    }
}

fn writes_label(kind: &StepKind) -> String {
    match kind {
        StepKind::Single { payload } => format!("{} fields", payload.len()),
        StepKind::Fanout { children } => {
            let nested: usize = children.iter().map(|c| c.dependents.len()).sum();
            if nested == 0 {
                format!("{} children", children.len())
            } else {
                format!("{} children (+{} nested)", children.len(), nested)
            }
        }
        StepKind::DualPath {
            history_path,
            children,
            ..
        } => format!("{} children, copied to {}", children.len(), history_path),
    }
}
