//! Entry point for loading configuration.

use super::merge::merge_policy;
use super::sources::{global_file, workspace_file};
use super::AxiomConfig;
use config::{ConfigError, File};
use std::path::Path;
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Order (later wins): defaults, `~/.config/axiom/config.toml`,
    /// `<root>/config/config.toml`, `<root>/config/{AXIOM_ENV}.toml`, `AXIOM__*` variables.
    pub fn load(workspace_root: &Path) -> Result<AxiomConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let config = builder
            .add_source(merge_policy::environment_source())
            .build()?
            .try_deserialize::<AxiomConfig>()?;
        debug!(workspace = %workspace_root.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load a single explicit file on top of the defaults; no other source is consulted.
    pub fn load_from_file(path: &Path) -> Result<AxiomConfig, ConfigError> {
        merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize::<AxiomConfig>()
    }
}
