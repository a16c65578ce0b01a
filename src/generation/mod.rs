//! Spec-to-suite generation: four service-backed stages and the orchestrator that runs them.
//!
//! Every stage first tries the generation service (`try_*`) and then branches explicitly
//! on the failure to a deterministic fallback, so each stage is a total operation.
//! Only document I/O can fail a run.

pub mod analyst;
pub mod composer;
pub mod extractor;
pub mod fence;
pub mod orchestrator;
pub mod quoting;
pub mod run;
pub mod schema;
pub mod synthesizer;

pub use analyst::ScenarioAnalyst;
pub use composer::{ExtractedCode, ExtractionBranch, SuiteComposer};
pub use extractor::RequirementExtractor;
pub use orchestrator::{GeneratedSuite, PipelineOrchestrator, RunSummary};
pub use run::{run, run_with_provider, RunRequest};
pub use synthesizer::TestSynthesizer;

use crate::error::StageError;
use crate::provider::{ChatMessage, CompletionOptions, ModelProviderClient};
use crate::types::{Requirement, TestScenario, TestUnit};
use async_trait::async_trait;
use tracing::debug;

/// Per-component settings handed in at construction
#[derive(Debug, Clone, PartialEq)]
pub struct StageSettings {
    pub options: CompletionOptions,
    /// Log full prompts and replies at debug level
    pub log_payloads: bool,
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            options: CompletionOptions::default(),
            log_payloads: false,
        }
    }
}

/// Result of a total stage operation: the service-backed value or the fallback with its cause.
#[derive(Debug)]
pub enum StageOutcome<T> {
    Generated(T),
    Fallback { value: T, cause: StageError },
}

impl<T> StageOutcome<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, StageOutcome::Fallback { .. })
    }

    pub fn value(&self) -> &T {
        match self {
            StageOutcome::Generated(value) | StageOutcome::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            StageOutcome::Generated(value) | StageOutcome::Fallback { value, .. } => value,
        }
    }
}

#[async_trait]
pub trait RequirementExtraction: Send + Sync {
    async fn extract(&self, document: &str) -> StageOutcome<Vec<Requirement>>;
}

#[async_trait]
pub trait ScenarioAnalysis: Send + Sync {
    async fn analyze(&self, requirement: &Requirement) -> StageOutcome<TestScenario>;
}

#[async_trait]
pub trait TestSynthesis: Send + Sync {
    async fn synthesize(&self, scenario: &TestScenario, target_host: &str)
        -> StageOutcome<TestUnit>;
}

#[async_trait]
pub trait SuiteComposition: Send + Sync {
    async fn compose(&self, units: &[TestUnit], target_host: &str) -> StageOutcome<String>;
}

/// One blocking round trip to the generation service for `stage`.
pub(crate) async fn request_completion(
    provider: &dyn ModelProviderClient,
    settings: &StageSettings,
    stage: &'static str,
    system_prompt: String,
    user_prompt: String,
) -> Result<String, StageError> {
    if settings.log_payloads {
        debug!(stage, system = %system_prompt, user = %user_prompt, "Prompt");
    }
    let messages = vec![ChatMessage::system(system_prompt), ChatMessage::user(user_prompt)];
    let response = provider
        .complete(messages, settings.options.clone())
        .await?;
    if settings.log_payloads {
        debug!(stage, reply = %response.content, "Reply");
    }
    debug!(
        stage,
        provider = provider.provider_name(),
        model = %response.model,
        tokens = response.usage.total_tokens,
        "Generation service replied"
    );
    Ok(response.content)
}
