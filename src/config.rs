//! Configuration System
//!
//! Layered configuration for the generation pipeline: built-in defaults, the user-level
//! file, workspace files and `AXIOM__*` environment variables, merged with the `config`
//! crate and validated before use.

use crate::logging::LoggingConfig;
use crate::provider::ProviderConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod facade;
mod merge {
    pub mod merge_policy;
}
mod sources {
    pub mod global_file;
    pub mod workspace_file;
}

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Environment variable selecting `config/{name}.toml` inside the workspace
pub const ENV_NAME_VAR: &str = "AXIOM_ENV";
/// Prefix for per-key overrides, e.g. `AXIOM__PIPELINE__TARGET_HOST`
pub const ENV_PREFIX: &str = "AXIOM";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxiomConfig {
    /// Generation service settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Document, output and host settings for a pipeline run
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_spec_path")]
    pub spec_path: PathBuf,

    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Host baked into the generated module as the fallback `BASE_URL`
    #[serde(default = "default_target_host")]
    pub target_host: String,

    /// Environment variable the generated module consults before `target_host`
    #[serde(default = "default_host_override_var")]
    pub host_override_var: String,

    /// Log full prompts and replies at debug level
    #[serde(default)]
    pub log_payloads: bool,
}

pub(crate) fn default_spec_path() -> PathBuf {
    PathBuf::from("docs/project_sample.md")
}

pub(crate) fn default_output_path() -> PathBuf {
    PathBuf::from("tests/generated_suite_test.py")
}

pub(crate) fn default_target_host() -> String {
    "http://localhost:8000".to_string()
}

pub(crate) fn default_host_override_var() -> String {
    crate::generation::composer::DEFAULT_HOST_OVERRIDE_VAR.to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            spec_path: default_spec_path(),
            output_path: default_output_path(),
            target_host: default_target_host(),
            host_override_var: default_host_override_var(),
            log_payloads: false,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.spec_path.as_os_str().is_empty() {
            return Err("Spec path cannot be empty".to_string());
        }
        if self.output_path.as_os_str().is_empty() {
            return Err("Output path cannot be empty".to_string());
        }
        if !(self.target_host.starts_with("http://") || self.target_host.starts_with("https://"))
        {
            return Err(format!(
                "Target host must be an http(s) URL, got '{}'",
                self.target_host
            ));
        }
        if !crate::types::is_valid_identifier(&self.host_override_var) {
            return Err(format!(
                "Host override variable '{}' is not a valid environment variable name",
                self.host_override_var
            ));
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Provider(String),
    Pipeline(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(msg) => write!(f, "Provider: {}", msg),
            ValidationError::Pipeline(msg) => write!(f, "Pipeline: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl AxiomConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.provider.validate() {
            errors.push(ValidationError::Provider(e));
        }

        if let Err(e) = self.pipeline.validate() {
            errors.push(ValidationError::Pipeline(e));
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            errors.push(ValidationError::Logging(format!(
                "Invalid log format: {}",
                self.logging.format
            )));
        }
        if !matches!(self.logging.output.as_str(), "stdout" | "stderr" | "file") {
            errors.push(ValidationError::Logging(format!(
                "Invalid log output: {}",
                self.logging.output
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// TOML rendering with the credential masked
    pub fn to_redacted_toml(&self) -> Result<String, crate::error::ApiError> {
        let mut shown = self.clone();
        if shown.provider.api_key.is_some() {
            shown.provider.api_key = Some("<redacted>".to_string());
        }
        toml::to_string_pretty(&shown).map_err(|e| {
            crate::error::ApiError::ConfigError(format!("Failed to render config: {}", e))
        })
    }
}
