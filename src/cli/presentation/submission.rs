//! Execution result output.

use super::shared::to_pretty_json;
use crate::error::ApiError;
use crate::pipeline::{ExecutionResult, StepOutcome, StepStatus};
use comfy_table::Table;
use owo_colors::OwoColorize;

pub fn format_execution_json(result: &ExecutionResult) -> Result<String, ApiError> {
    to_pretty_json(result)
}

pub fn format_execution_text(result: &ExecutionResult, color: bool) -> String {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["#", "Path", "Kind", "Status", "ID", "Detail"]);
    for step in &result.steps {
        table.add_row(vec![
            step.index.to_string(),
            step.resource_path.clone(),
            step.kind.clone(),
            status_label(step.status, color),
            step.id.as_ref().map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()),
            detail(step),
        ]);
    }
    format!("{}\n{}", table, summary_line(result))
}

fn status_label(status: StepStatus, color: bool) -> String {
    let label = status.as_str();
    if !color {
        return label.to_string();
    }
    match status {
        StepStatus::Succeeded => label.green().to_string(),
        StepStatus::Failed => label.red().to_string(),
        StepStatus::Skipped | StepStatus::NotAttempted => label.dimmed().to_string(),
        StepStatus::Cancelled => label.yellow().to_string(),
    }
}

fn detail(step: &StepOutcome) -> String {
    if step.children.is_empty() {
        return step
            .error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_default();
    }
    let failed = step.failed_children();
    let mut text = format!(
        "{}/{} children written",
        step.children.len() - failed,
        step.children.len()
    );
    for child in step.children.iter().filter(|c| !c.succeeded()) {
        for error in &child.errors {
            text.push_str(&format!("\nchild {}: {}", child.index, error));
        }
    }
    text
}

fn summary_line(result: &ExecutionResult) -> String {
    if result.cancelled {
        let done = result.count(StepStatus::Succeeded);
        return format!(
            "Submission {} cancelled after {} committed step(s)",
            result.context, done
        );
    }
    match result.failed_step() {
        Some(step) => format!(
            "Submission {} failed at step {}; earlier steps remain committed",
            result.context, step.index
        ),
        None => match &result.root_id {
            Some(id) => format!("Submission {} succeeded (root id {})", result.context, id),
            None => format!("Submission {} succeeded", result.context),
        },
    }
}
