//! Config loader facade: assembles sources in precedence order and deserializes.

use super::merge::merge_policy;
use super::sources::{environment, global_file, workspace_file};
use super::DeskConfig;
use config::{ConfigError, File};
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence, lowest first: defaults, global file, workspace files, environment.
    pub fn load(workspace_root: &Path) -> Result<DeskConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// Load a single explicit file on top of the defaults. Environment overrides still apply.
    pub fn load_from_file(path: &Path) -> Result<DeskConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true));
        environment::add_to_builder(builder).build()?.try_deserialize()
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    /// Defaults only, no files or environment.
    pub fn defaults() -> Result<DeskConfig, ConfigError> {
        merge_policy::builder_with_defaults()?.build()?.try_deserialize()
    }
}
