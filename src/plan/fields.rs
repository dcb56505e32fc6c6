//! Field selection and per-field transformation applied before plan assembly.

use crate::error::CompositionError;
use crate::plan::lookup::LookupTables;
use crate::types::Payload;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Field name → "submit this field" flag, supplied in edit mode only.
pub type EditMask = BTreeMap<String, bool>;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Which fields need lookup-driven decoding. Loaded from `[pipeline.fields]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRules {
    /// Checkbox-group field → code book used to decode it.
    #[serde(default = "default_checkbox_groups")]
    pub checkbox_groups: BTreeMap<String, String>,

    /// Fields holding `{item, unit, amount}` breakdown rows.
    #[serde(default = "default_price_breakdowns")]
    pub price_breakdowns: Vec<String>,

    #[serde(default = "default_item_book")]
    pub item_book: String,

    #[serde(default = "default_unit_book")]
    pub unit_book: String,
}

fn default_checkbox_groups() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("channels".to_string(), "channel".to_string()),
        ("industries".to_string(), "industry".to_string()),
    ])
}

fn default_price_breakdowns() -> Vec<String> {
    vec!["item_prices".to_string()]
}

fn default_item_book() -> String {
    "item".to_string()
}

fn default_unit_book() -> String {
    "unit".to_string()
}

impl Default for FieldRules {
    fn default() -> Self {
        Self {
            checkbox_groups: default_checkbox_groups(),
            price_breakdowns: default_price_breakdowns(),
            item_book: default_item_book(),
            unit_book: default_unit_book(),
        }
    }
}

impl FieldRules {
    pub fn validate(&self) -> Result<(), String> {
        if self.item_book.trim().is_empty() || self.unit_book.trim().is_empty() {
            return Err("item_book and unit_book cannot be empty".to_string());
        }
        if let Some((field, _)) = self
            .checkbox_groups
            .iter()
            .find(|(_, book)| book.trim().is_empty())
        {
            return Err(format!("checkbox group `{}` has no code book", field));
        }
        Ok(())
    }
}

/// `null`, empty strings, empty lists and empty objects never reach a payload.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

pub fn drop_empty(payload: Payload) -> Payload {
    payload
        .into_iter()
        .filter(|(_, value)| !is_empty_value(value))
        .collect()
}

/// Keep only fields the mask marks `true`; without a mask keep everything.
pub fn select_fields(payload: &Payload, mask: Option<&EditMask>) -> Payload {
    match mask {
        None => payload.clone(),
        Some(mask) => payload
            .iter()
            .filter(|(key, _)| mask.get(key.as_str()).copied().unwrap_or(false))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    }
}

/// Apply date, checkbox-group and price-breakdown transforms to every field.
pub fn transform_fields(
    payload: Payload,
    rules: &FieldRules,
    lookups: &LookupTables,
) -> Result<Payload, CompositionError> {
    let mut out = Payload::new();
    for (field, value) in payload {
        if is_range_field(&field) && value.is_array() {
            let (start, end) = split_range(&field, &value)?;
            out.insert(format!("{field}_start"), Value::String(start));
            out.insert(format!("{field}_end"), Value::String(end));
        } else if is_date_field(&field) {
            let date = normalize_date(&field, &value)?;
            out.insert(field, Value::String(date));
        } else if let Some(book) = rules.checkbox_groups.get(&field) {
            let decoded = decode_checkbox_group(&field, &value, book, lookups)?;
            out.insert(field, decoded);
        } else if rules.price_breakdowns.iter().any(|f| f == &field) {
            let rows = denormalize_price_rows(&field, &value, rules, lookups)?;
            out.insert(field, rows);
        } else {
            out.insert(field, value);
        }
    }
    Ok(out)
}

pub fn is_range_field(name: &str) -> bool {
    name == "period" || name.ends_with("_period") || name.ends_with("_range")
}

pub fn is_date_field(name: &str) -> bool {
    name == "date" || name.ends_with("_date")
}

fn split_range(field: &str, value: &Value) -> Result<(String, String), CompositionError> {
    match value.as_array().map(Vec::as_slice) {
        Some([start, end]) => Ok((normalize_date(field, start)?, normalize_date(field, end)?)),
        _ => Err(CompositionError::InvalidDateRange {
            field: field.to_string(),
        }),
    }
}

/// Reduce a date, datetime or epoch-millisecond value to `YYYY-MM-DD`.
///
/// Datetimes keep the calendar date in their own offset.
pub fn normalize_date(field: &str, value: &Value) -> Result<String, CompositionError> {
    let invalid = || CompositionError::InvalidDate {
        field: field.to_string(),
        value: value.to_string(),
    };

    let date = match value {
        Value::String(raw) => {
            let raw = raw.trim();
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .ok()
                .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
                .or_else(|| {
                    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                        .ok()
                        .map(|dt| dt.date())
                })
                .ok_or_else(invalid)?
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.date_naive())
            .ok_or_else(invalid)?,
        _ => return Err(invalid()),
    };

    Ok(date.format(DATE_FORMAT).to_string())
}

fn decode_checkbox_group(
    field: &str,
    value: &Value,
    book: &str,
    lookups: &LookupTables,
) -> Result<Value, CompositionError> {
    let codes: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::String(_) | Value::Number(_) => vec![value],
        _ => {
            return Err(CompositionError::InvalidField {
                field: field.to_string(),
                reason: "checkbox group must hold a list of codes".to_string(),
            })
        }
    };

    codes
        .into_iter()
        .map(|code| {
            let name = lookups.resolve(book, code)?;
            Ok(json!({ "id": code, "name": name }))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn denormalize_price_rows(
    field: &str,
    value: &Value,
    rules: &FieldRules,
    lookups: &LookupTables,
) -> Result<Value, CompositionError> {
    let rows = value.as_array().ok_or_else(|| CompositionError::InvalidField {
        field: field.to_string(),
        reason: "price breakdown must be a list".to_string(),
    })?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let mut row = row
            .as_object()
            .cloned()
            .ok_or_else(|| CompositionError::InvalidField {
                field: field.to_string(),
                reason: "price breakdown rows must be objects".to_string(),
            })?;
        let item = row
            .get("item")
            .filter(|v| !is_empty_value(v))
            .cloned()
            .ok_or_else(|| CompositionError::InvalidField {
                field: field.to_string(),
                reason: "price breakdown row has no item".to_string(),
            })?;
        let item_name = lookups.resolve(&rules.item_book, &item)?;
        row.insert("item_name".to_string(), Value::String(item_name));

        if let Some(unit) = row.get("unit").filter(|v| !is_empty_value(v)).cloned() {
            let unit_name = lookups.resolve(&rules.unit_book, &unit)?;
            row.insert("unit_name".to_string(), Value::String(unit_name));
        }
        out.push(Value::Object(row));
    }
    Ok(Value::Array(out))
}
