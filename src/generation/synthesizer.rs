//! Test synthesis: one scenario → one runnable pytest function.

use crate::error::StageError;
use crate::generation::quoting::find_quote_collisions;
use crate::generation::schema::{format_instructions, parse_structured, TEST_UNIT_SCHEMA};
use crate::generation::{request_completion, StageOutcome, StageSettings, TestSynthesis};
use crate::provider::ModelProviderClient;
use crate::types::{TestScenario, TestUnit};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Name of the module-level host constant every test body relies on.
pub const BASE_URL_CONSTANT: &str = "BASE_URL";

fn system_prompt(target_host: &str) -> String {
    format!(
        "You are a senior SDET. Write one high-quality, robust pytest function for the test \
         scenario below. The base URL is defined at module level as `{constant} = '{host}'`; \
         use `{constant}` and never define it yourself. Use `httpx` for requests and include \
         the relevant response values in every assertion message.\n\n\
         IMPORTANT: when an f-string assertion message reads a value with a subscript, the \
         outer string must use a different quote character than the subscript. For example \
         write assert x == y, \"Error: {{data['key']}}\" with double quotes outside and single \
         quotes inside, never the same quote character in both places. Output valid JSON.",
        constant = BASE_URL_CONSTANT,
        host = target_host,
    )
}

/// `test_<requirement id>_fallback`, lower-cased, non-alphanumerics replaced by `_`.
pub fn fallback_function_name(requirement_id: &str) -> String {
    let slug: String = requirement_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("test_{}_fallback", slug)
}

/// Error text safe to embed in a single-line Python comment.
fn sanitize_error(message: &str) -> String {
    message
        .chars()
        .filter(|c| *c != '\'' && *c != '"')
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

/// Skip-marked unit used when synthesis fails.
pub fn fallback_unit(scenario: &TestScenario, error: &StageError) -> TestUnit {
    let function_name = fallback_function_name(&scenario.requirement_id);
    let code = format!(
        "def {name}():\n    import pytest\n    # Error: {error}\n    pytest.skip('Test generation failed, see the comment above for details')",
        name = function_name,
        error = sanitize_error(&error.to_string()),
    );
    TestUnit {
        requirement_id: scenario.requirement_id.clone(),
        scenario_id: scenario.scenario_id.clone(),
        function_name,
        code,
        description: "Fallback test due to generation failure".to_string(),
    }
}

/// Column-0 assignment to the host constant. `BASE_URL == x` is a comparison, not a definition.
pub(crate) fn is_host_assignment(line: &str) -> bool {
    line.strip_prefix(BASE_URL_CONSTANT)
        .map(|rest| rest.trim_start_matches(|c: char| c == ' ' || c == '\t'))
        .and_then(|rest| rest.strip_prefix('='))
        .map_or(false, |value| !value.starts_with('='))
}

/// Drop module-level host definitions a unit must not carry.
fn strip_constant_definitions(code: &str) -> String {
    code.lines()
        .filter(|line| !is_host_assignment(line))
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct TestSynthesizer {
    provider: Arc<dyn ModelProviderClient>,
    settings: StageSettings,
}

impl TestSynthesizer {
    pub fn new(provider: Arc<dyn ModelProviderClient>, settings: StageSettings) -> Self {
        Self { provider, settings }
    }

    pub async fn try_synthesize(
        &self,
        scenario: &TestScenario,
        target_host: &str,
    ) -> Result<TestUnit, StageError> {
        let scenario_json = serde_json::to_string(scenario)
            .map_err(|e| StageError::SchemaValidation(e.to_string()))?;
        let user_prompt = format!(
            "Scenario: {}\n\n{}",
            scenario_json,
            format_instructions(TEST_UNIT_SCHEMA)
        );
        let reply = request_completion(
            self.provider.as_ref(),
            &self.settings,
            "synthesize",
            system_prompt(target_host),
            user_prompt,
        )
        .await?;

        let mut unit: TestUnit = parse_structured(&reply)?;
        unit.requirement_id = scenario.requirement_id.clone();
        unit.scenario_id = scenario.scenario_id.clone();

        let stripped = strip_constant_definitions(&unit.code);
        if stripped != unit.code {
            debug!(
                function = %unit.function_name,
                "Removed host constant definition from generated test"
            );
            unit.code = stripped;
        }

        let collisions = find_quote_collisions(&unit.code);
        if let Some(first) = collisions.first() {
            return Err(StageError::SchemaValidation(format!(
                "{} f-string quote collision(s) in {}, first on line {}: {}",
                collisions.len(),
                unit.function_name,
                first.line,
                first.snippet
            )));
        }
        Ok(unit)
    }
}

#[async_trait]
impl TestSynthesis for TestSynthesizer {
    async fn synthesize(
        &self,
        scenario: &TestScenario,
        target_host: &str,
    ) -> StageOutcome<TestUnit> {
        match self.try_synthesize(scenario, target_host).await {
            Ok(unit) => StageOutcome::Generated(unit),
            Err(cause) => {
                warn!(
                    requirement_id = %scenario.requirement_id,
                    error = %cause,
                    "Test synthesis failed, emitting skipped test"
                );
                StageOutcome::Fallback {
                    value: fallback_unit(scenario, &cause),
                    cause,
                }
            }
        }
    }
}
