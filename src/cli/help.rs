//! CLI command-name contract for logging and routing.

use crate::cli::parse::{Commands, ConfigCommands};

/// Command name string for log fields (e.g. "submit", "config.show").
pub fn command_name(command: &Commands) -> String {
    match command {
        Commands::Normalize { .. } => "normalize".to_string(),
        Commands::Fetch { .. } => "fetch".to_string(),
        Commands::Plan { .. } => "plan".to_string(),
        Commands::Submit { .. } => "submit".to_string(),
        Commands::Config { command } => format!("config.{}", config_command_name(command)),
    }
}

pub fn config_command_name(command: &ConfigCommands) -> &'static str {
    match command {
        ConfigCommands::Show { .. } => "show",
        ConfigCommands::Validate => "validate",
    }
}
