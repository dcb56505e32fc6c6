//! CLI parse: clap types for salesdesk. No behavior; definitions only.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Salesdesk CLI - normalize content API envelopes and submit staged form writes
#[derive(Parser)]
#[command(name = "salesdesk")]
#[command(about = "Normalize content API envelopes and submit staged form writes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (holds config/)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Flatten an API response envelope into plain records
    Normalize {
        /// Envelope JSON file; omit or pass `-` to read stdin
        input: Option<PathBuf>,
        /// Output format (json or table)
        #[arg(long, default_value = "json")]
        format: String,
    },
    /// Read a collection or member path from the API and normalize it
    Fetch {
        /// Resource path, e.g. `customers?populate=*`
        path: String,
        /// Output format (json or table)
        #[arg(long, default_value = "json")]
        format: String,
    },
    /// Compose a submission plan without sending anything
    Plan {
        #[command(flatten)]
        form: FormArgs,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Compose a submission plan and execute it against the API
    Submit {
        #[command(flatten)]
        form: FormArgs,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Inputs shared by `plan` and `submit`.
#[derive(Args, Debug, Clone)]
pub struct FormArgs {
    /// Screen context, e.g. `sales.create` or `project.revenue.add`
    #[arg(long)]
    pub context: String,

    /// Target record identifier for edit and action screens
    #[arg(long)]
    pub target: Option<String>,

    /// Raw form payload (JSON object); `-` reads stdin
    #[arg(long)]
    pub payload: PathBuf,

    /// Edit mask (JSON object of field name to boolean)
    #[arg(long)]
    pub mask: Option<PathBuf>,

    /// Code books (JSON object of book name to {code: display name})
    #[arg(long)]
    pub lookups: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show {
        /// Output format (toml or json)
        #[arg(long, default_value = "toml")]
        format: String,
    },
    /// Validate the effective configuration
    Validate,
}
