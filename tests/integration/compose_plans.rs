//! Plan composition for every screen family.

use super::test_utils::payload;
use salesdesk::error::CompositionError;
use salesdesk::plan::{
    ContextKind, EditMask, IdSource, LookupTables, PlanComposer, ScreenContext, StepAction,
    StepKind,
};
use serde_json::json;

fn composer() -> PlanComposer {
    PlanComposer::default()
}

fn lookups() -> LookupTables {
    LookupTables::new()
        .with_book("channel", [("1", "Online"), ("2", "Partner")].into_iter().collect())
        .with_book("item", [("10", "Workshop")].into_iter().collect())
        .with_book("unit", [("h", "hour")].into_iter().collect())
}

fn single_payload(kind: &StepKind) -> &salesdesk::types::Payload {
    match kind {
        StepKind::Single { payload } => payload,
        other => panic!("expected single step, got {}", other.label()),
    }
}

#[test]
fn sales_create_plans_record_then_payments() {
    let raw = payload(json!({
        "title": "Annual license",
        "revenue": 1000,
        "margin_mode": "percentage",
        "margin_value": 20,
        "confirmed": true,
        "probability": "30",
        "contract_date": "2024-03-05T10:00:00+09:00",
        "channels": [1, 2],
        "memo": "",
        "payments": [
            {"amount": 600, "due_date": "2024-04-01"},
            {"amount": 400, "due_date": "2024-05-01"},
            {"amount": null}
        ]
    }));
    let plan = composer()
        .compose(&ScreenContext::new(ContextKind::SalesCreate), &raw, None, &lookups())
        .unwrap();

    assert_eq!(plan.context, "sales.create");
    assert_eq!(plan.len(), 2);
    assert!(plan.validate().is_ok());

    let record = single_payload(&plan.steps[0].kind);
    assert_eq!(plan.steps[0].resource_path, "sales-records");
    assert_eq!(record["profit"], json!(200));
    assert_eq!(record["probability"], json!("100"));
    assert_eq!(record["contract_date"], json!("2024-03-05"));
    assert_eq!(
        record["channels"],
        json!([{"id": 1, "name": "Online"}, {"id": 2, "name": "Partner"}])
    );
    assert!(!record.contains_key("memo"));
    assert!(!record.contains_key("payments"));

    let step = &plan.steps[1];
    assert_eq!(step.resource_path, "sales-payments");
    let relation = step.relation_key.as_ref().unwrap();
    assert_eq!(relation.field_name, "sales_record");
    assert_eq!(relation.source, IdSource::RootId);
    match &step.kind {
        StepKind::Fanout { children } => {
            assert_eq!(children.len(), 2, "empty payment rows are dropped");
            assert_eq!(children[0].payload["due_date"], json!("2024-04-01"));
        }
        other => panic!("expected fan-out, got {}", other.label()),
    }
}

#[test]
fn sales_create_without_payments_skips_fanout() {
    let raw = payload(json!({
        "title": "Deal", "revenue": 500, "margin_mode": "fixed", "margin_value": 150
    }));
    let plan = composer()
        .compose(&ScreenContext::new(ContextKind::SalesCreate), &raw, None, &lookups())
        .unwrap();
    assert_eq!(single_payload(&plan.steps[0].kind)["profit"], json!(150));
    assert_eq!(plan.steps[1].action, StepAction::Skip);
    assert_eq!(plan.active_steps(), 1);
}

#[test]
fn sales_edit_recomputes_profit_from_masked_margin() {
    let raw = payload(json!({
        "title": "Deal", "revenue": 2000, "margin_mode": "percentage", "margin_value": 15
    }));
    let mask = EditMask::from([("margin_value".to_string(), true)]);
    let plan = composer()
        .compose(
            &ScreenContext::new(ContextKind::SalesEdit).with_target(12i64),
            &raw,
            Some(&mask),
            &lookups(),
        )
        .unwrap();

    assert_eq!(plan.steps[0].resource_path, "sales-records/12");
    assert_eq!(plan.steps[0].action, StepAction::Update);
    assert_eq!(
        single_payload(&plan.steps[0].kind),
        &payload(json!({"margin_value": 15, "profit": 300}))
    );
}

#[test]
fn project_create_writes_revenues_with_history() {
    let raw = payload(json!({
        "name": "Rollout",
        "period": ["2024-01-01", "2024-06-30"],
        "revenues": [{"amount": 300, "item_prices": [{"item": 10, "unit": "h", "amount": 300}]}]
    }));
    let plan = composer()
        .compose(&ScreenContext::new(ContextKind::ProjectCreate), &raw, None, &lookups())
        .unwrap();

    let project = single_payload(&plan.steps[0].kind);
    assert_eq!(project["period_start"], json!("2024-01-01"));
    assert_eq!(project["period_end"], json!("2024-06-30"));
    assert!(!project.contains_key("period"));

    match &plan.steps[1].kind {
        StepKind::DualPath {
            history_path,
            link_field,
            children,
        } => {
            assert_eq!(history_path, "project-revenue-histories");
            assert_eq!(link_field.as_deref(), Some("project_revenue"));
            assert_eq!(children[0]["item_prices"][0]["item_name"], json!("Workshop"));
            assert_eq!(children[0]["item_prices"][0]["unit_name"], json!("hour"));
        }
        other => panic!("expected dual-path, got {}", other.label()),
    }
}

#[test]
fn proposal_convert_creates_project_contract_and_marks_proposal() {
    let raw = payload(json!({
        "name": "Rollout",
        "contract": {"signed_date": "2024-02-01", "amount": 5000}
    }));
    let plan = composer()
        .compose(
            &ScreenContext::new(ContextKind::ProposalConvert).with_target(8i64),
            &raw,
            None,
            &lookups(),
        )
        .unwrap();

    let paths: Vec<&str> = plan.steps.iter().map(|s| s.resource_path.as_str()).collect();
    assert_eq!(paths, vec!["projects", "project-contracts", "proposals/8"]);
    assert_eq!(single_payload(&plan.steps[0].kind)["proposal"], json!(8));
    assert_eq!(
        plan.steps[1].relation_key.as_ref().map(|r| r.source),
        Some(IdSource::PreviousId)
    );
    assert_eq!(plan.steps[2].action, StepAction::Update);
    assert_eq!(single_payload(&plan.steps[2].kind)["status"], json!("converted"));
}

#[test]
fn program_create_nests_attendees_under_sessions() {
    let raw = payload(json!({
        "name": "Bootcamp",
        "sessions": [
            {"title": "Day 1", "date": "2024-09-01", "attendees": [{"name": "Kim"}, {"name": ""}]},
            {"title": "Day 2", "date": "2024-09-02"}
        ]
    }));
    let plan = composer()
        .compose(&ScreenContext::new(ContextKind::ProgramCreate), &raw, None, &lookups())
        .unwrap();

    match &plan.steps[1].kind {
        StepKind::Fanout { children } => {
            assert_eq!(children.len(), 2);
            assert_eq!(children[0].dependents.len(), 1);
            assert_eq!(children[0].dependents[0].resource_path, "session-attendees");
            assert_eq!(children[0].dependents[0].parent_field, "session");
            assert!(children[1].dependents.is_empty());
        }
        other => panic!("expected fan-out, got {}", other.label()),
    }
}

#[test]
fn composition_errors_abort_before_any_plan() {
    let raw = payload(json!({"name": "Acme", "channels": [99]}));
    let err = composer()
        .compose(&ScreenContext::new(ContextKind::CustomerCreate), &raw, None, &lookups())
        .unwrap_err();
    assert!(matches!(err, CompositionError::UnknownCode { .. }));

    let err = ScreenContext::parse("invoice.create", None).unwrap_err();
    assert_eq!(err, CompositionError::UnknownContext("invoice.create".to_string()));
}

#[test]
fn non_numeric_revenue_never_yields_null_profit() {
    let raw = payload(json!({
        "title": "x", "revenue": "NaN", "margin_mode": "percentage", "margin_value": 20
    }));
    let err = composer()
        .compose(&ScreenContext::new(ContextKind::SalesCreate), &raw, None, &lookups())
        .unwrap_err();
    assert!(matches!(err, CompositionError::InvalidField { ref field, .. } if field == "revenue"));
}
