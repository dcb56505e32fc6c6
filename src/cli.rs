//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::{map_error, CommandOutput, EXIT_SUBMISSION_INCOMPLETE};
pub use parse::{Cli, Commands, ConfigCommands, FormArgs};
pub use presentation::{
    format_config, format_execution_json, format_execution_text, format_plan_json,
    format_plan_text, format_records_json, format_records_table,
};
pub use route::RunContext;
