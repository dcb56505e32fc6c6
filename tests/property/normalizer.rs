use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use salesdesk::envelope::{
    normalize, normalize_json, Envelope, EnvelopeNode, FlatRecord, PROMOTE_AFTER_RELATIONS,
};
use serde_json::{json, Value};

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[a-z ]{0,12}".prop_map(Value::from),
    ]
}

fn node_of(
    attribute: impl Strategy<Value = Envelope> + Clone,
) -> impl Strategy<Value = EnvelopeNode> + Clone {
    (
        1i64..100_000,
        prop::collection::btree_map("k_[a-z]{1,6}", attribute, 0..5),
    )
        .prop_map(|(id, attrs)| {
            attrs
                .into_iter()
                .fold(EnvelopeNode::new(id), |node, (key, value)| node.with(key, value))
        })
}

fn envelope() -> impl Strategy<Value = Envelope> + Clone {
    let leaf = prop_oneof![
        3 => scalar().prop_map(Envelope::Scalar),
        1 => Just(Envelope::Null),
    ];
    leaf.prop_recursive(4, 48, 5, |inner| {
        let node = node_of(inner);
        prop_oneof![
            node.clone().prop_map(|n| Envelope::Single(Box::new(n))),
            prop::collection::vec(node, 0..4).prop_map(Envelope::Many),
        ]
    })
}

fn node() -> impl Strategy<Value = EnvelopeNode> {
    node_of(envelope())
}

fn to_json(node: &EnvelopeNode) -> Value {
    let attributes: serde_json::Map<String, Value> = node
        .attributes
        .iter()
        .map(|(key, value)| {
            let raw = match value {
                Envelope::Scalar(v) => v.clone(),
                Envelope::Null => json!({"data": null}),
                Envelope::Single(child) => json!({"data": to_json(child)}),
                Envelope::Many(children) => {
                    json!({"data": children.iter().map(to_json).collect::<Vec<_>>()})
                }
            };
            (key.clone(), raw)
        })
        .collect();
    json!({"id": node.id, "attributes": attributes})
}

/// Every wrapper keeps its key; lists keep length and order; unpromoted relations nest.
fn check_node(node: &EnvelopeNode, record: &FlatRecord) -> Result<(), TestCaseError> {
    prop_assert_eq!(record.get("id"), node.id.as_ref());
    let mut relations = 0usize;
    for (key, value) in &node.attributes {
        let Some(out) = record.get(key) else {
            return Err(TestCaseError::fail(format!("key `{key}` missing")));
        };
        match value {
            Envelope::Scalar(v) => prop_assert_eq!(out, v),
            Envelope::Null => prop_assert_eq!(out, &Value::Null),
            Envelope::Many(children) if children.is_empty() => prop_assert_eq!(out, &Value::Null),
            Envelope::Many(children) => {
                let items = out.as_array().cloned().unwrap_or_default();
                prop_assert_eq!(items.len(), children.len());
                for (child, item) in children.iter().zip(&items) {
                    let Value::Object(flat) = item else {
                        return Err(TestCaseError::fail(format!("`{key}` item is not a record")));
                    };
                    check_node(child, flat)?;
                }
                relations += 1;
            }
            Envelope::Single(child) => {
                let Value::Object(flat) = out else {
                    return Err(TestCaseError::fail(format!("`{key}` is not a record")));
                };
                if relations < PROMOTE_AFTER_RELATIONS {
                    check_node(child, flat)?;
                } else {
                    prop_assert_eq!(flat.get("id"), child.id.as_ref());
                    prop_assert_eq!(flat.len(), 1);
                }
                relations += 1;
            }
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn output_keeps_length_and_order(nodes in prop::collection::vec(node(), 0..12)) {
        let records = normalize(&nodes);
        prop_assert_eq!(records.len(), nodes.len());
        for (record, node) in records.iter().zip(&nodes) {
            prop_assert_eq!(record.get("id"), node.id.as_ref());
        }
    }

    #[test]
    fn every_wrapper_keeps_one_key(node in node()) {
        let record = normalize(std::slice::from_ref(&node)).remove(0);
        check_node(&node, &record)?;
    }

    #[test]
    fn well_formed_bodies_never_fail(nodes in prop::collection::vec(node(), 0..8)) {
        let body = json!({"data": nodes.iter().map(to_json).collect::<Vec<_>>()});
        let records = normalize_json(&body);
        prop_assert!(records.is_ok(), "{:?}", records.as_ref().err());
        prop_assert_eq!(records.ok(), Some(normalize(&nodes)));
    }

    #[test]
    fn nested_aux_is_never_lost(outer in 1i64..1000, inner in 1000i64..2000, deep in scalar()) {
        let node = EnvelopeNode::new(1).with(
            "moreinfo",
            Envelope::Single(Box::new(EnvelopeNode::new(outer).with(
                "moreinfo",
                Envelope::Single(Box::new(EnvelopeNode::new(inner).with("deep", Envelope::Scalar(deep.clone())))),
            ))),
        );
        let record = normalize(std::slice::from_ref(&node)).remove(0);
        prop_assert_eq!(&record["moreinfo"]["id"], &json!(outer));
        prop_assert_eq!(&record["moreinfo"]["moreinfo"], &json!({"id": inner, "deep": deep}));
    }

    #[test]
    fn normalization_is_deterministic(nodes in prop::collection::vec(node(), 0..8)) {
        prop_assert_eq!(normalize(&nodes), normalize(&nodes));
    }
}
