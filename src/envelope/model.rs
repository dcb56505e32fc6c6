//! Tagged envelope tree parsed from raw API JSON.

use crate::error::NormalizationError;
use serde_json::{Map, Value};

/// Flat, UI-ready record produced by the normalizer.
pub type FlatRecord = Map<String, Value>;

/// Key that marks a relation wrapper on the wire.
const WRAPPER_KEY: &str = "data";
/// Keys the API may place next to `data` inside a wrapper.
const WRAPPER_SIDE_KEYS: [&str; 1] = ["meta"];

/// One attribute value of an envelope node.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// Plain value or an object that is not a relation wrapper.
    Scalar(Value),
    /// `{data: null}`
    Null,
    /// `{data: {id, attributes}}`
    Single(Box<EnvelopeNode>),
    /// `{data: [...]}`
    Many(Vec<EnvelopeNode>),
}

/// An `{id, attributes}` node. Attribute order follows the source document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnvelopeNode {
    pub id: Option<Value>,
    pub attributes: Vec<(String, Envelope)>,
}

impl Envelope {
    /// Classify a raw attribute value.
    pub fn from_json(value: &Value, path: &str) -> Result<Self, NormalizationError> {
        let Some(obj) = value.as_object() else {
            return Ok(Envelope::Scalar(value.clone()));
        };
        if !is_wrapper(obj) {
            return Ok(Envelope::Scalar(value.clone()));
        }

        let data_path = format!("{path}.{WRAPPER_KEY}");
        match &obj[WRAPPER_KEY] {
            Value::Null => Ok(Envelope::Null),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| EnvelopeNode::from_json(item, &format!("{data_path}[{i}]")))
                .collect::<Result<Vec<_>, _>>()
                .map(Envelope::Many),
            single => EnvelopeNode::from_json(single, &data_path)
                .map(|node| Envelope::Single(Box::new(node))),
        }
    }
}

impl EnvelopeNode {
    /// Parse an `{id, attributes}` node, failing closed on anything else.
    pub fn from_json(value: &Value, path: &str) -> Result<Self, NormalizationError> {
        let obj = value
            .as_object()
            .ok_or_else(|| NormalizationError::NodeNotObject {
                path: path.to_string(),
                found: json_kind(value).to_string(),
            })?;

        let id = obj.get("id").filter(|v| !v.is_null()).cloned();
        let attributes = match obj.get("attributes") {
            None | Some(Value::Null) if id.is_none() => {
                return Err(NormalizationError::EmptyWrapperNode {
                    path: path.to_string(),
                })
            }
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Object(attrs)) => attrs
                .iter()
                .map(|(key, raw)| {
                    Envelope::from_json(raw, &format!("{path}.{key}"))
                        .map(|parsed| (key.clone(), parsed))
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(NormalizationError::AttributesNotObject {
                    path: path.to_string(),
                    found: json_kind(other).to_string(),
                })
            }
        };

        Ok(Self { id, attributes })
    }

    /// Convenience constructor used by tests and fixtures.
    pub fn new(id: impl Into<Value>) -> Self {
        Self {
            id: Some(id.into()),
            attributes: Vec::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: Envelope) -> Self {
        self.attributes.push((key.into(), value));
        self
    }
}

fn is_wrapper(obj: &Map<String, Value>) -> bool {
    obj.contains_key(WRAPPER_KEY)
        && obj
            .keys()
            .all(|k| k == WRAPPER_KEY || WRAPPER_SIDE_KEYS.contains(&k.as_str()))
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
