//! Scenario analysis: one requirement → one test scenario.

use crate::error::StageError;
use crate::generation::schema::{format_instructions, parse_structured, TEST_SCENARIO_SCHEMA};
use crate::generation::{request_completion, ScenarioAnalysis, StageOutcome, StageSettings};
use crate::provider::ModelProviderClient;
use crate::types::{Requirement, TestScenario};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = "You are an expert QA analyst. Break the requirement down into one \
detailed, logical test scenario written as Given/When/Then steps. Anticipate edge cases and \
adverse paths, including authentication failures, malformed input and other security-relevant \
behaviour. Output must be valid JSON conforming to the schema.";

pub const FALLBACK_SCENARIO_PREFIX: &str = "SCN-FALLBACK-";

/// Scenario used when analysis fails. Depends only on the requirement's id and title.
pub fn fallback_scenario(requirement: &Requirement) -> TestScenario {
    TestScenario {
        requirement_id: requirement.id.clone(),
        scenario_id: format!("{}{}", FALLBACK_SCENARIO_PREFIX, requirement.id),
        description: format!("Fallback scenario for {}", requirement.title),
        steps: vec!["Check logs".to_string(), "Verify failure".to_string()],
        expected_result: "Error".to_string(),
        test_data: BTreeMap::new(),
    }
}

pub struct ScenarioAnalyst {
    provider: Arc<dyn ModelProviderClient>,
    settings: StageSettings,
}

impl ScenarioAnalyst {
    pub fn new(provider: Arc<dyn ModelProviderClient>, settings: StageSettings) -> Self {
        Self { provider, settings }
    }

    pub async fn try_analyze(&self, requirement: &Requirement) -> Result<TestScenario, StageError> {
        let requirement_json = serde_json::to_string(requirement)
            .map_err(|e| StageError::SchemaValidation(e.to_string()))?;
        let user_prompt = format!(
            "Requirement: {}\n\n{}",
            requirement_json,
            format_instructions(TEST_SCENARIO_SCHEMA)
        );
        let reply = request_completion(
            self.provider.as_ref(),
            &self.settings,
            "analyze",
            SYSTEM_PROMPT.to_string(),
            user_prompt,
        )
        .await?;

        let mut scenario: TestScenario = parse_structured(&reply)?;
        if scenario.requirement_id != requirement.id {
            debug!(
                reported = %scenario.requirement_id,
                requirement_id = %requirement.id,
                "Scenario reported a different requirement id, rebinding"
            );
            scenario.requirement_id = requirement.id.clone();
        }
        Ok(scenario)
    }
}

#[async_trait]
impl ScenarioAnalysis for ScenarioAnalyst {
    async fn analyze(&self, requirement: &Requirement) -> StageOutcome<TestScenario> {
        match self.try_analyze(requirement).await {
            Ok(scenario) => StageOutcome::Generated(scenario),
            Err(cause) => {
                warn!(
                    requirement_id = %requirement.id,
                    error = %cause,
                    "Scenario analysis failed, using fallback scenario"
                );
                StageOutcome::Fallback {
                    value: fallback_scenario(requirement),
                    cause,
                }
            }
        }
    }
}
