//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cli::help::command_name;
use crate::cli::output::CommandOutput;
use crate::cli::parse::{Commands, ConfigCommands, FormArgs};
use crate::cli::presentation::{
    format_config, format_execution_json, format_execution_text, format_plan_json,
    format_plan_text, format_records_json, format_records_table,
};
use crate::config::{ConfigLoader, DeskConfig};
use crate::envelope::{normalize_json, FlatRecord};
use crate::error::ApiError;
use crate::plan::{EditMask, LookupTables, ScreenContext, SubmissionPlan};
use crate::types::{EntityId, Payload};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Runtime context for CLI execution: workspace and the effective configuration.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    workspace_root: PathBuf,
    config: DeskConfig,
}

impl RunContext {
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Ok(Self::with_config(workspace_root, config))
    }

    pub fn with_config(workspace_root: PathBuf, config: DeskConfig) -> Self {
        Self {
            workspace_root,
            config,
        }
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<CommandOutput, ApiError> {
        let started = Instant::now();
        let name = command_name(command);
        let result = self.execute_inner(command);
        match &result {
            Ok(output) => info!(
                command = %name,
                success = output.success,
                duration_ms = started.elapsed().as_millis() as u64,
                "command finished"
            ),
            Err(e) => warn!(command = %name, error = %e, "command failed"),
        }
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<CommandOutput, ApiError> {
        match command {
            Commands::Normalize { input, format } => {
                let body: Value = read_json(input.as_deref())?;
                let records = normalize_json(&body)?;
                format_records(&records, format).map(CommandOutput::ok)
            }
            Commands::Fetch { path, format } => {
                self.config.ensure_valid()?;
                let client = self.config.api.build_client()?;
                let runtime = new_runtime()?;
                let body = runtime.block_on(client.fetch(path))?;
                let records = normalize_json(&body)?;
                format_records(&records, format).map(CommandOutput::ok)
            }
            Commands::Plan { form, format } => {
                let plan = self.compose(form)?;
                match format.as_str() {
                    "json" => format_plan_json(&plan).map(CommandOutput::ok),
                    _ => Ok(CommandOutput::ok(format_plan_text(&plan))),
                }
            }
            Commands::Submit { form, format } => self.handle_submit(form, format),
            Commands::Config { command } => match command {
                ConfigCommands::Show { format } => {
                    format_config(&self.config, format).map(CommandOutput::ok)
                }
                ConfigCommands::Validate => {
                    self.config.ensure_valid()?;
                    Ok(CommandOutput::ok("Configuration is valid"))
                }
            },
        }
    }

    /// Read the form inputs and compose a plan. No network access.
    fn compose(&self, form: &FormArgs) -> Result<SubmissionPlan, ApiError> {
        self.config.ensure_valid()?;
        let target = form.target.as_deref().map(EntityId::from);
        let context = ScreenContext::parse(&form.context, target)?;
        let payload: Payload = read_json(Some(&form.payload))?;
        let mask: Option<EditMask> = form.mask.as_deref().map(|p| read_json(Some(p))).transpose()?;
        let lookups: LookupTables = match &form.lookups {
            Some(path) => read_json(Some(path))?,
            None => LookupTables::new(),
        };

        let plan = self
            .config
            .pipeline
            .composer()
            .compose(&context, &payload, mask.as_ref(), &lookups)?;
        Ok(plan)
    }

    fn handle_submit(&self, form: &FormArgs, format: &str) -> Result<CommandOutput, ApiError> {
        let plan = self.compose(form)?;
        let client = self.config.api.build_client()?;
        let executor = self.config.pipeline.executor();
        let runtime = new_runtime()?;

        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        runtime.spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received; stopping after the current step");
                on_interrupt.cancel();
            }
        });

        let result = runtime.block_on(executor.execute(&client, &plan, &cancel))?;
        let text = match format {
            "json" => format_execution_json(&result)?,
            _ => format_execution_text(&result, std::io::stdout().is_terminal()),
        };
        if result.succeeded() {
            Ok(CommandOutput::ok(text))
        } else {
            Ok(CommandOutput::incomplete(text))
        }
    }
}

fn new_runtime() -> Result<Runtime, ApiError> {
    Runtime::new().map_err(|e| ApiError::ConfigError(format!("Failed to create runtime: {}", e)))
}

fn format_records(records: &[FlatRecord], format: &str) -> Result<String, ApiError> {
    match format {
        "table" => Ok(format_records_table(records)),
        _ => format_records_json(records),
    }
}

/// Parse JSON from a file, or from stdin when the path is absent or `-`.
fn read_json<T: DeserializeOwned>(path: Option<&Path>) -> Result<T, ApiError> {
    let raw = match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path).map_err(|e| {
            ApiError::InvalidInput(format!("Failed to read {}: {}", path.display(), e))
        })?,
        _ => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    Ok(serde_json::from_str(&raw)?)
}
