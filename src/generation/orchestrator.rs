//! Pipeline orchestrator: extract once, analyze + synthesize per requirement, compose once.
//! Stages absorb their own failures, so the orchestrator has no error branch.

use crate::generation::{
    RequirementExtraction, ScenarioAnalysis, StageOutcome, SuiteComposition, TestSynthesis,
};
use crate::generation::{
    RequirementExtractor, ScenarioAnalyst, StageSettings, SuiteComposer, TestSynthesizer,
};
use crate::provider::ModelProviderClient;
use crate::types::TestUnit;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, info_span, Instrument};

/// What happened during one pipeline pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub requirement_count: usize,
    pub extraction_fallback: bool,
    /// Requirement ids whose scenario came from the fallback
    pub scenario_fallbacks: Vec<String>,
    /// Requirement ids whose test unit came from the fallback
    pub synthesis_fallbacks: Vec<String>,
    pub composition_fallback: bool,
    /// Test function names in suite order
    pub functions: Vec<String>,
}

impl RunSummary {
    pub fn fully_generated(&self) -> bool {
        !self.extraction_fallback
            && !self.composition_fallback
            && self.scenario_fallbacks.is_empty()
            && self.synthesis_fallbacks.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedSuite {
    pub module: String,
    pub units: Vec<TestUnit>,
    pub summary: RunSummary,
}

pub struct PipelineOrchestrator {
    extractor: Box<dyn RequirementExtraction>,
    analyst: Box<dyn ScenarioAnalysis>,
    synthesizer: Box<dyn TestSynthesis>,
    composer: Box<dyn SuiteComposition>,
}

impl PipelineOrchestrator {
    pub fn new(
        extractor: Box<dyn RequirementExtraction>,
        analyst: Box<dyn ScenarioAnalysis>,
        synthesizer: Box<dyn TestSynthesis>,
        composer: Box<dyn SuiteComposition>,
    ) -> Self {
        Self {
            extractor,
            analyst,
            synthesizer,
            composer,
        }
    }

    /// All four stages backed by one generation service.
    pub fn from_provider(
        provider: Arc<dyn ModelProviderClient>,
        settings: StageSettings,
        host_override_var: &str,
    ) -> Self {
        Self::new(
            Box::new(RequirementExtractor::new(provider.clone(), settings.clone())),
            Box::new(ScenarioAnalyst::new(provider.clone(), settings.clone())),
            Box::new(TestSynthesizer::new(provider.clone(), settings.clone())),
            Box::new(SuiteComposer::with_override_var(
                provider,
                settings,
                host_override_var,
            )),
        )
    }

    pub async fn generate(&self, document: &str, target_host: &str) -> GeneratedSuite {
        let mut summary = RunSummary::default();

        let extracted = self.extractor.extract(document).await;
        summary.extraction_fallback = extracted.is_fallback();
        let requirements = extracted.into_value();
        summary.requirement_count = requirements.len();
        info!(count = requirements.len(), "Collecting test units");

        let mut units = Vec::with_capacity(requirements.len());
        let mut used_names = HashSet::new();
        for (index, requirement) in requirements.iter().enumerate() {
            let span = info_span!("requirement", id = %requirement.id, index);
            let unit = async {
                let analyzed = self.analyst.analyze(requirement).await;
                if analyzed.is_fallback() {
                    summary.scenario_fallbacks.push(requirement.id.clone());
                }
                let scenario = analyzed.into_value();
                info!(scenario_id = %scenario.scenario_id, "Analyzed");

                let synthesized = self.synthesizer.synthesize(&scenario, target_host).await;
                if synthesized.is_fallback() {
                    summary.synthesis_fallbacks.push(requirement.id.clone());
                }
                let unit = synthesized.into_value();
                info!(function = %unit.function_name, "Synthesized");
                unit
            }
            .instrument(span)
            .await;

            units.push(ensure_unique_name(unit, &mut used_names));
        }

        let composed = self.composer.compose(&units, target_host).await;
        summary.composition_fallback = composed.is_fallback();
        summary.functions = units.iter().map(|u| u.function_name.clone()).collect();
        let module = match composed {
            StageOutcome::Generated(module) => module,
            StageOutcome::Fallback { value, .. } => value,
        };

        info!(
            functions = summary.functions.len(),
            fully_generated = summary.fully_generated(),
            "Suite composed"
        );

        GeneratedSuite {
            module,
            units,
            summary,
        }
    }
}

/// Rename a unit whose function name is already taken to `<name>_<n>`, in both the
/// metadata and its `def` line.
fn ensure_unique_name(mut unit: TestUnit, used: &mut HashSet<String>) -> TestUnit {
    if used.insert(unit.function_name.clone()) {
        return unit;
    }
    let mut suffix = 2;
    let renamed = loop {
        let candidate = format!("{}_{}", unit.function_name, suffix);
        if used.insert(candidate.clone()) {
            break candidate;
        }
        suffix += 1;
    };
    unit.code = unit.code.replacen(
        &format!("def {}(", unit.function_name),
        &format!("def {}(", renamed),
        1,
    );
    unit.function_name = renamed;
    unit
}
