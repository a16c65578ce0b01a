//! Pipeline entry point: read a spec document, generate, write the module.

use crate::error::PipelineError;
use crate::generation::composer::DEFAULT_HOST_OVERRIDE_VAR;
use crate::generation::{PipelineOrchestrator, RunSummary, StageSettings};
use crate::provider::{resolve_credential, ModelProviderClient, ProviderConfig, ProviderFactory};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything one pipeline run needs
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub spec_path: PathBuf,
    pub output_path: PathBuf,
    pub target_host: String,
    /// Explicit credential; when absent `OPENAI_API_KEY` is consulted
    pub credential: Option<String>,
    pub provider: ProviderConfig,
    pub settings: StageSettings,
    pub host_override_var: String,
}

impl RunRequest {
    pub fn new(
        spec_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        target_host: impl Into<String>,
    ) -> Self {
        Self {
            spec_path: spec_path.into(),
            output_path: output_path.into(),
            target_host: target_host.into(),
            credential: None,
            provider: ProviderConfig::default(),
            settings: StageSettings::default(),
            host_override_var: DEFAULT_HOST_OVERRIDE_VAR.to_string(),
        }
    }
}

/// Resolve the credential, build the generation client and run the pipeline.
///
/// Only document I/O and an unusable provider configuration fail the run; every
/// generation failure is absorbed by the stage fallbacks.
pub async fn run(request: &RunRequest) -> Result<RunSummary, PipelineError> {
    let credential = resolve_credential(request.credential.as_deref());
    if credential.is_none() {
        warn!("No credential found, calling the generation service unauthenticated");
    }
    let model_provider = request.provider.to_model_provider(credential);
    let client: Arc<dyn ModelProviderClient> =
        Arc::from(ProviderFactory::create_client(&model_provider)?);
    info!(
        provider = client.provider_name(),
        model = client.model_name(),
        "Generation service ready"
    );
    run_with_provider(request, client).await
}

/// Run the pipeline against an already constructed generation client.
pub async fn run_with_provider(
    request: &RunRequest,
    provider: Arc<dyn ModelProviderClient>,
) -> Result<RunSummary, PipelineError> {
    let document = read_document(&request.spec_path)?;
    info!(path = ?request.spec_path, bytes = document.len(), "Read spec document");

    let orchestrator = PipelineOrchestrator::from_provider(
        provider,
        request.settings.clone(),
        &request.host_override_var,
    );
    let suite = orchestrator
        .generate(&document, &request.target_host)
        .await;

    write_module(&request.output_path, &suite.module)?;
    info!(
        path = ?request.output_path,
        functions = suite.summary.functions.len(),
        "Wrote test module"
    );
    Ok(suite.summary)
}

fn read_document(path: &Path) -> Result<String, PipelineError> {
    fs::read_to_string(path).map_err(|source| PipelineError::DocumentRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Full overwrite through a temp file and rename, so readers never see a partial module.
fn write_module(path: &Path, module: &str) -> Result<(), PipelineError> {
    let write_error = |source| PipelineError::ModuleWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_error)?;
    }

    let temp_path = path.with_extension("py.tmp");
    fs::write(&temp_path, module).map_err(write_error)?;
    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        write_error(e)
    })?;
    Ok(())
}
