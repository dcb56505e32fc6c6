//! Composed plans executed end to end against a recording API.

use super::test_utils::{payload, RecordingApi};
use salesdesk::pipeline::{StagedWriteExecutor, StepStatus};
use salesdesk::plan::{ContextKind, LookupTables, PlanComposer, ScreenContext, SubmissionPlan};
use salesdesk::types::EntityId;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

fn compose(context: ScreenContext, raw: Value) -> SubmissionPlan {
    PlanComposer::default()
        .compose(&context, &payload(raw), None, &LookupTables::new())
        .unwrap()
}

fn sales_form() -> Value {
    json!({
        "title": "Annual license",
        "revenue": 1000,
        "margin_mode": "fixed",
        "margin_value": 250,
        "payments": [{"amount": 600}, {"amount": 400}]
    })
}

#[tokio::test]
async fn sales_create_links_payments_to_record() {
    let api = RecordingApi::new(42);
    let plan = compose(ScreenContext::new(ContextKind::SalesCreate), sales_form());

    let result = StagedWriteExecutor::new()
        .execute(&api, &plan, &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.succeeded());
    assert_eq!(result.root_id, Some(EntityId::Number(42)));
    let payments = api.calls_to("sales-payments");
    assert_eq!(payments.len(), 2);
    for call in &payments {
        assert_eq!(call.method, "POST");
        assert_eq!(call.payload["sales_record"], json!(42));
    }
    assert_eq!(result.steps[1].children.len(), 2);
}

#[tokio::test]
async fn proposal_convert_chains_project_contract_and_status() {
    let api = RecordingApi::new(7);
    let plan = compose(
        ScreenContext::new(ContextKind::ProposalConvert).with_target(3i64),
        json!({"name": "Rollout", "contract": {"amount": 5000}}),
    );

    let result = StagedWriteExecutor::new()
        .execute(&api, &plan, &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.succeeded());
    let calls = api.calls();
    let order: Vec<(&str, &str)> = calls
        .iter()
        .map(|c| (c.method, c.path.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("POST", "projects"),
            ("POST", "project-contracts"),
            ("PUT", "proposals/3"),
        ]
    );
    assert_eq!(calls[0].payload["proposal"], json!(3));
    assert_eq!(calls[1].payload["project"], json!(7));
    assert_eq!(calls[2].payload, payload(json!({"status": "converted", "project": 7})));
}

#[tokio::test]
async fn project_create_writes_history_copy_per_revenue() {
    let api = RecordingApi::new(1);
    let plan = compose(
        ScreenContext::new(ContextKind::ProjectCreate),
        json!({"name": "Rollout", "revenues": [{"amount": 100}, {"amount": 200}]}),
    );

    let result = StagedWriteExecutor::new()
        .execute(&api, &plan, &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.succeeded());
    let revenues = api.calls_to("project-revenues");
    let histories = api.calls_to("project-revenue-histories");
    assert_eq!(revenues.len(), 2);
    assert_eq!(histories.len(), 2);
    assert_eq!(revenues[0].payload["project"], json!(1));
    // project=1, revenue 100 → 2, its history → 3, revenue 200 → 4
    assert_eq!(histories[0].payload["project_revenue"], json!(2));
    assert_eq!(histories[1].payload["project_revenue"], json!(4));
    assert_eq!(histories[1].payload["amount"], json!(200));
}

#[tokio::test]
async fn rejected_root_halts_before_children() {
    let api = RecordingApi::new(1).rejecting("sales-records");
    let plan = compose(ScreenContext::new(ContextKind::SalesCreate), sales_form());

    let result = StagedWriteExecutor::new()
        .execute(&api, &plan, &CancellationToken::new())
        .await
        .unwrap();

    assert!(!result.succeeded());
    assert_eq!(result.steps[0].status, StepStatus::Failed);
    assert_eq!(result.steps[1].status, StepStatus::NotAttempted);
    assert_eq!(result.steps[0].error.as_ref().and_then(|e| e.status), Some(422));
    assert!(api.calls_to("sales-payments").is_empty());
    assert_eq!(result.root_id, None);
}

#[tokio::test]
async fn rejected_children_are_all_attempted() {
    let api = RecordingApi::new(1).rejecting("sales-payments");
    let plan = compose(ScreenContext::new(ContextKind::SalesCreate), sales_form());

    let result = StagedWriteExecutor::with_fanout_concurrency(2)
        .execute(&api, &plan, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.steps[1].status, StepStatus::Failed);
    assert_eq!(result.steps[1].failed_children(), 2);
    assert_eq!(api.calls_to("sales-payments").len(), 2);
    assert_eq!(result.failed_step().map(|s| s.index), Some(1));
}

#[tokio::test]
async fn cancelled_before_start_sends_nothing() {
    let api = RecordingApi::new(1);
    let plan = compose(ScreenContext::new(ContextKind::SalesCreate), sales_form());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = StagedWriteExecutor::new()
        .execute(&api, &plan, &cancel)
        .await
        .unwrap();

    assert!(result.cancelled);
    assert!(!result.succeeded());
    assert_eq!(result.count(StepStatus::Cancelled), 2);
    assert!(api.calls().is_empty());
}
