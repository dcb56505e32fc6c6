//! Envelope → flat record collapse.
//!
//! Single depth-first pass. Every wrapper keeps exactly one key in the output:
//! `null` wrappers and empty lists become `null`, lists become lists of flat
//! records, single nodes become nested flat records (or an `{id}` stub when
//! promoted, see [`PROMOTE_AFTER_RELATIONS`]).

use crate::envelope::model::{json_kind, Envelope, EnvelopeNode, FlatRecord};
use crate::error::NormalizationError;
use serde_json::{json, Value};
use tracing::debug;

/// Relation whose attributes are hoisted into the parent record.
pub const AUX_RELATION: &str = "moreinfo";

/// Once a node has collected this many sibling relations, further single
/// relations are promoted: the key keeps an `{id}` stub and the related
/// attributes are merged into the parent without overwriting its own fields.
pub const PROMOTE_AFTER_RELATIONS: usize = 2;

/// Normalize a list of top-level entries. Output order and length match the input.
pub fn normalize(entries: &[EnvelopeNode]) -> Vec<FlatRecord> {
    entries.iter().map(|node| flatten_node(node, true)).collect()
}

/// Parse and normalize a raw response body.
///
/// Accepts a bare list of entries, `{data: [...]}`, or `{data: {...}}` (a single entry
/// yields a one-element list).
pub fn normalize_json(body: &Value) -> Result<Vec<FlatRecord>, NormalizationError> {
    let (entries, path) = match body {
        Value::Array(items) => (items.as_slice(), "$"),
        Value::Object(obj) if obj.contains_key("data") => match &obj["data"] {
            Value::Array(items) => (items.as_slice(), "$.data"),
            Value::Null => return Ok(Vec::new()),
            single => {
                let node = EnvelopeNode::from_json(single, "$.data")?;
                return Ok(normalize(std::slice::from_ref(&node)));
            }
        },
        other => {
            return Err(NormalizationError::NotAnEntryList {
                path: "$".to_string(),
                found: json_kind(other).to_string(),
            })
        }
    };

    let nodes = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| EnvelopeNode::from_json(entry, &format!("{path}[{i}]")))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(normalize(&nodes))
}

fn flatten_node(node: &EnvelopeNode, allow_aux: bool) -> FlatRecord {
    let mut record = FlatRecord::new();
    if let Some(id) = &node.id {
        record.insert("id".to_string(), id.clone());
    }

    let mut relations = 0usize;
    let mut hoisted: Vec<FlatRecord> = Vec::new();

    for (key, value) in &node.attributes {
        match value {
            Envelope::Scalar(v) => {
                record.insert(key.clone(), v.clone());
            }
            Envelope::Null => {
                record.insert(key.clone(), Value::Null);
            }
            Envelope::Many(children) if children.is_empty() => {
                record.insert(key.clone(), Value::Null);
            }
            Envelope::Many(children) => {
                let flattened = children
                    .iter()
                    .map(|child| Value::Object(flatten_node(child, true)))
                    .collect();
                record.insert(key.clone(), Value::Array(flattened));
                relations += 1;
            }
            Envelope::Single(child) if allow_aux && key == AUX_RELATION => {
                let mut fields = without_id(flatten_node(child, false));
                let mut stub = id_stub(child);
                // The stub owns this key, so an inner aux relation stays under it.
                if let (Some(inner), Value::Object(stub)) = (fields.remove(AUX_RELATION), &mut stub) {
                    stub.insert(AUX_RELATION.to_string(), inner);
                }
                record.insert(key.clone(), stub);
                hoisted.push(fields);
            }
            Envelope::Single(child) => {
                let flattened = flatten_node(child, true);
                if relations >= PROMOTE_AFTER_RELATIONS {
                    record.insert(key.clone(), id_stub(child));
                    hoisted.push(without_id(flattened));
                } else {
                    record.insert(key.clone(), Value::Object(flattened));
                }
                relations += 1;
            }
        }
    }

    for fields in hoisted {
        for (key, value) in fields {
            if record.contains_key(&key) {
                debug!(field = %key, "hoisted field shadowed by parent field");
                continue;
            }
            record.insert(key, value);
        }
    }

    record
}

fn id_stub(node: &EnvelopeNode) -> Value {
    json!({ "id": node.id.clone().unwrap_or(Value::Null) })
}

fn without_id(mut record: FlatRecord) -> FlatRecord {
    record.remove("id");
    record
}
