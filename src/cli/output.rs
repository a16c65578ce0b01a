//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ApiError, PipelineError};
use thiserror::Error;

/// Everything a CLI command can fail with
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Configuration is invalid:\n{0}")]
    InvalidConfig(String),
}

impl From<config::ConfigError> for CliError {
    fn from(err: config::ConfigError) -> Self {
        CliError::Api(err.into())
    }
}

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &CliError) -> String {
    match e {
        CliError::Pipeline(PipelineError::DocumentRead { path, .. }) => format!(
            "{}\nCheck --spec or pipeline.spec_path; {:?} must be a readable markdown file.",
            e,
            path
        ),
        _ => e.to_string(),
    }
}
