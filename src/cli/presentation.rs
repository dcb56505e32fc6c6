//! CLI presentation: text and json formatters per command family.

mod plan;
mod records;
mod shared;
mod submission;

pub use plan::{format_plan_json, format_plan_text};
pub use records::{format_records_json, format_records_table};
pub use shared::format_config;
pub use submission::{format_execution_json, format_execution_text};
