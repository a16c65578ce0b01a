//! Error types for the Axiom spec-to-test pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Provider and configuration errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Provider request failed: {0}")]
    ProviderRequestFailed(String),

    #[error("Provider authentication failed: {0}")]
    ProviderAuthFailed(String),

    #[error("Provider rate limit exceeded: {0}")]
    ProviderRateLimit(String),

    #[error("Provider model not found: {0}")]
    ProviderModelNotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

/// Failure of a single generation stage.
///
/// Every variant is recovered by the stage that produced it; none of them
/// reaches the caller of [`crate::generation::run`].
#[derive(Debug, Error)]
pub enum StageError {
    #[error("generation service call failed: {0}")]
    ServiceInvocation(#[from] ApiError),

    #[error("reply does not match the expected schema: {0}")]
    SchemaValidation(String),

    #[error("no code content found in reply: {0}")]
    Extraction(String),
}

/// Terminal failures of a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to read spec document {path:?}: {source}")]
    DocumentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write test module {path:?}: {source}")]
    ModuleWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to set up generation service: {0}")]
    Config(#[from] ApiError),
}
