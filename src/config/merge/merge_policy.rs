//! Merge rules: defaults first, later sources override earlier ones key by key.

use super::super::{
    default_host_override_var, default_output_path, default_spec_path, default_target_host,
    ENV_PREFIX,
};
use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default(
            "pipeline.spec_path",
            default_spec_path().to_string_lossy().to_string(),
        )?
        .set_default(
            "pipeline.output_path",
            default_output_path().to_string_lossy().to_string(),
        )?
        .set_default("pipeline.target_host", default_target_host())?
        .set_default("pipeline.host_override_var", default_host_override_var())?
        .set_default("pipeline.log_payloads", false)
}

/// `AXIOM__SECTION__KEY` overrides, applied last.
pub fn environment_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
