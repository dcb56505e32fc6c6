//! Envelope normalization against realistic list responses.

use salesdesk::envelope::{normalize, normalize_json, Envelope, EnvelopeNode};
use salesdesk::error::NormalizationError;
use serde_json::{json, Value};

fn records(body: Value) -> Value {
    Value::Array(
        normalize_json(&body)
            .unwrap()
            .into_iter()
            .map(Value::Object)
            .collect(),
    )
}

#[test]
fn customer_list_response_flattens_every_entry() {
    let body = json!({
        "data": [
            {"id": 1, "attributes": {
                "name": "Acme",
                "region": {"data": {"id": 5, "attributes": {"name": "Seoul"}}},
                "manager": {"data": null},
                "contacts": {"data": []}
            }},
            {"id": 2, "attributes": {
                "name": "Globex",
                "region": {"data": {"id": 6, "attributes": {"name": "Busan"}}},
                "manager": {"data": {"id": 9, "attributes": {"name": "Park"}}},
                "contacts": {"data": [{"id": 20, "attributes": {"email": "a@globex.test"}}]}
            }}
        ],
        "meta": {"pagination": {"page": 1, "pageSize": 25, "total": 2}}
    });

    assert_eq!(
        records(body),
        json!([
            {"id": 1, "name": "Acme", "region": {"id": 5, "name": "Seoul"}, "manager": null, "contacts": null},
            {"id": 2, "name": "Globex", "region": {"id": 6, "name": "Busan"},
             "manager": {"id": 9, "name": "Park"},
             "contacts": [{"id": 20, "email": "a@globex.test"}]}
        ])
    );
}

#[test]
fn output_preserves_length_and_order() {
    let body = json!({"data": (1..=20)
        .map(|i| json!({"id": i, "attributes": {"seq": i}}))
        .collect::<Vec<_>>()});
    let out = normalize_json(&body).unwrap();
    assert_eq!(out.len(), 20);
    for (i, record) in out.iter().enumerate() {
        assert_eq!(record["id"], json!(i + 1));
    }
}

#[test]
fn empty_data_yields_no_records() {
    assert!(normalize_json(&json!({"data": []})).unwrap().is_empty());
    assert!(normalize_json(&json!({"data": null})).unwrap().is_empty());
}

#[test]
fn sales_record_with_aux_and_promoted_relations() {
    let body = json!({"data": {"id": 100, "attributes": {
        "title": "Annual license",
        "customer": {"data": {"id": 1, "attributes": {"name": "Acme"}}},
        "program": {"data": {"id": 2, "attributes": {"name": "Bootcamp"}}},
        "project": {"data": {"id": 3, "attributes": {"title": "Rollout", "phase": "kickoff"}}},
        "moreinfo": {"data": {"id": 4, "attributes": {"memo": "renewal", "title": "ignored"}}}
    }}});

    let out = records(body);
    let record = &out[0];
    assert_eq!(record["customer"], json!({"id": 1, "name": "Acme"}));
    assert_eq!(record["program"], json!({"id": 2, "name": "Bootcamp"}));
    assert_eq!(record["project"], json!({"id": 3}));
    assert_eq!(record["phase"], json!("kickoff"));
    assert_eq!(record["moreinfo"], json!({"id": 4}));
    assert_eq!(record["memo"], json!("renewal"));
    assert_eq!(record["title"], json!("Annual license"));
    assert_eq!(record["id"], json!(100));
}

#[test]
fn typed_entries_normalize_without_json() {
    let entry = EnvelopeNode::new(1)
        .with("name", Envelope::Scalar(json!("A")))
        .with("owner", Envelope::Null)
        .with("tags", Envelope::Many(Vec::new()));
    let out = normalize(&[entry]);
    assert_eq!(
        Value::Object(out[0].clone()),
        json!({"id": 1, "name": "A", "owner": null, "tags": null})
    );
}

#[test]
fn malformed_relation_fails_closed() {
    let body = json!({"data": [{"id": 1, "attributes": {"region": {"data": "Seoul"}}}]});
    let err = normalize_json(&body).unwrap_err();
    assert!(matches!(err, NormalizationError::NodeNotObject { .. }));
}
