//! Derived sales fields: profit amount and confirmed probability.

use crate::error::CompositionError;
use crate::plan::fields::EditMask;
use crate::types::Payload;
use serde_json::Value;
use std::str::FromStr;

pub const REVENUE: &str = "revenue";
pub const MARGIN_MODE: &str = "margin_mode";
pub const MARGIN_VALUE: &str = "margin_value";
pub const PROFIT: &str = "profit";
pub const CONFIRMED: &str = "confirmed";
pub const PROBABILITY: &str = "probability";

const PROFIT_INPUTS: [&str; 3] = [REVENUE, MARGIN_MODE, MARGIN_VALUE];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginMode {
    Fixed,
    Percentage,
}

impl FromStr for MarginMode {
    type Err = CompositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "fixed" => Ok(MarginMode::Fixed),
            "percentage" => Ok(MarginMode::Percentage),
            other => Err(CompositionError::UnknownMarginMode(other.to_string())),
        }
    }
}

/// `value` for a fixed margin, `revenue * value / 100` rounded half up for a percentage.
///
/// Halves round toward positive infinity, so `-2.5` becomes `-2`.
pub fn compute_profit(revenue: f64, mode: MarginMode, value: f64) -> f64 {
    match mode {
        MarginMode::Fixed => value,
        MarginMode::Percentage => (revenue * value / 100.0 + 0.5).floor(),
    }
}

/// Policy knobs for [`apply_sales_policy`].
#[derive(Debug, Clone, Copy)]
pub struct SalesPolicy<'a> {
    pub confirmed_code: &'a str,
    /// Create screens must always carry a profit.
    pub require_profit: bool,
}

/// Derive `profit` and force the confirmed probability on a sales payload.
///
/// Inputs are read from `source` (the full, unmasked form) so an edit that only
/// changes the margin still gets a correct profit. Outputs are written to
/// `payload` when no mask is active or when the mask selected one of their inputs.
pub fn apply_sales_policy(
    context: &str,
    source: &Payload,
    mask: Option<&EditMask>,
    payload: &mut Payload,
    policy: SalesPolicy<'_>,
) -> Result<(), CompositionError> {
    let touched = |fields: &[&str]| match mask {
        None => true,
        Some(mask) => fields
            .iter()
            .any(|f| mask.get(*f).copied().unwrap_or(false)),
    };

    let any_input = PROFIT_INPUTS.iter().any(|f| source.contains_key(*f));
    if policy.require_profit || (any_input && touched(&PROFIT_INPUTS[..])) {
        let revenue = number_field(context, source, REVENUE)?;
        let mode: MarginMode = string_field(context, source, MARGIN_MODE)?.parse()?;
        let value = number_field(context, source, MARGIN_VALUE)?;
        let profit = number_value(PROFIT, compute_profit(revenue, mode, value))?;
        payload.insert(PROFIT.to_string(), profit);
    }

    let confirmed = source
        .get(CONFIRMED)
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if confirmed && touched(&[CONFIRMED, PROBABILITY][..]) {
        payload.insert(
            PROBABILITY.to_string(),
            Value::String(policy.confirmed_code.to_string()),
        );
    }
    Ok(())
}

fn number_field(context: &str, source: &Payload, field: &str) -> Result<f64, CompositionError> {
    let value = source.get(field).ok_or_else(|| missing(context, field))?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|n| n.is_finite())
        .ok_or_else(|| CompositionError::InvalidField {
            field: field.to_string(),
            reason: format!("expected a finite number, found {}", value),
        })
}

fn string_field<'a>(
    context: &str,
    source: &'a Payload,
    field: &str,
) -> Result<&'a str, CompositionError> {
    source
        .get(field)
        .ok_or_else(|| missing(context, field))?
        .as_str()
        .ok_or_else(|| CompositionError::InvalidField {
            field: field.to_string(),
            reason: "expected a string".to_string(),
        })
}

fn missing(context: &str, field: &str) -> CompositionError {
    CompositionError::MissingField {
        context: context.to_string(),
        field: field.to_string(),
    }
}

/// Whole amounts serialize as integers. Non-finite amounts have no JSON form.
fn number_value(field: &str, amount: f64) -> Result<Value, CompositionError> {
    if !amount.is_finite() {
        return Err(CompositionError::InvalidField {
            field: field.to_string(),
            reason: format!("computed amount {} is not finite", amount),
        });
    }
    if amount.fract() == 0.0 && amount.abs() < i64::MAX as f64 {
        Ok(Value::from(amount as i64))
    } else {
        Ok(Value::from(amount))
    }
}
