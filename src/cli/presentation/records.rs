//! Normalized record output.

use super::shared::{cell, to_pretty_json};
use crate::envelope::FlatRecord;
use crate::error::ApiError;
use comfy_table::Table;

pub fn format_records_json(records: &[FlatRecord]) -> Result<String, ApiError> {
    to_pretty_json(records)
}

/// One row per record; columns are the union of keys in first-seen order.
pub fn format_records_table(records: &[FlatRecord]) -> String {
    if records.is_empty() {
        return "No records.".to_string();
    }

    let mut columns: Vec<&str> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(columns.clone());
    for record in records {
        table.add_row(
            columns
                .iter()
                .map(|column| record.get(*column).map(cell).unwrap_or_default())
                .collect::<Vec<_>>(),
        );
    }
    table.to_string()
}
