//! Suite composition: ordered test units → one pytest module with an injected host header.
//!
//! The service merges the units; its free-form reply is reduced to code by an
//! order-sensitive extraction: a `python` fence, then any fence, then every line from the
//! first import or function definition onward. Empty results count as extraction failure.

use crate::error::StageError;
use crate::generation::fence::{fenced_blocks, first_tagged};
use crate::generation::synthesizer::{is_host_assignment, BASE_URL_CONSTANT};
use crate::generation::{request_completion, StageOutcome, StageSettings, SuiteComposition};
use crate::provider::ModelProviderClient;
use crate::types::TestUnit;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Default environment variable overriding the host at test time
pub const DEFAULT_HOST_OVERRIDE_VAR: &str = "AXIOM_TARGET_HOST";

const SYSTEM_PROMPT: &str = "You are a senior release engineer. Assemble the following Python \
test functions into one complete, valid pytest module, keeping every function and its order. \
Add all necessary imports (pytest, httpx, etc.).\n\nIMPORTANT: Do NOT define `BASE_URL`. It \
will be injected. Use `BASE_URL` in the code assuming it exists. Return ONLY the Python code, \
without conversational text.";

/// Which extraction rule produced the code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionBranch {
    TaggedFence,
    AnyFence,
    StructuralLines,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedCode {
    pub branch: ExtractionBranch,
    pub code: String,
}

fn is_structural(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with("import ")
        || line.starts_with("from ")
        || line.starts_with("def ")
        || line.starts_with("async def ")
}

/// Reduce a composer reply to module code.
pub fn extract_code(reply: &str) -> Result<ExtractedCode, StageError> {
    if let Some(block) = first_tagged(reply, &["python", "py"]) {
        let code = block.body.trim();
        if !code.is_empty() {
            return Ok(ExtractedCode {
                branch: ExtractionBranch::TaggedFence,
                code: code.to_string(),
            });
        }
    }

    if let Some(block) = fenced_blocks(reply).first() {
        let code = block.body.trim();
        if !code.is_empty() {
            return Ok(ExtractedCode {
                branch: ExtractionBranch::AnyFence,
                code: code.to_string(),
            });
        }
    }

    let retained: Vec<&str> = reply
        .lines()
        .skip_while(|line| !is_structural(line))
        .collect();
    let code = retained.join("\n");
    if !code.trim().is_empty() {
        return Ok(ExtractedCode {
            branch: ExtractionBranch::StructuralLines,
            code: code.trim_end().to_string(),
        });
    }

    Err(StageError::Extraction(format!(
        "reply of {} characters has no fenced block and no import or def line",
        reply.len()
    )))
}

/// Python single-quoted literal for `value`.
fn python_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn host_definition(target_host: &str, override_var: &str) -> String {
    format!(
        "{} = os.getenv({}, {})",
        BASE_URL_CONSTANT,
        python_literal(override_var),
        python_literal(target_host)
    )
}

/// Header prepended to a service-composed module
pub fn module_header(target_host: &str, override_var: &str) -> String {
    format!(
        "# Generated by Axiom Engine\nimport os\nimport pytest\nimport httpx\n\n# Dynamic Host Configuration\n{}\n\n",
        host_definition(target_host, override_var)
    )
}

/// Header used by the concatenation fallback
pub fn fallback_header(target_host: &str, override_var: &str) -> String {
    format!(
        "# Generated by Axiom Engine (Fallback)\nimport pytest\nimport httpx\nimport os\n{}\n",
        host_definition(target_host, override_var)
    )
}

/// Header followed by the unit bodies, unmodified, in input order.
pub fn concatenate_units(units: &[TestUnit], target_host: &str, override_var: &str) -> String {
    let bodies: Vec<&str> = units.iter().map(|unit| unit.code.as_str()).collect();
    format!(
        "{}{}",
        fallback_header(target_host, override_var),
        bodies.join("\n\n")
    )
}

/// Top-level `def test*` names in order of appearance.
pub fn test_function_names(code: &str) -> Vec<String> {
    code.lines()
        .filter_map(|line| {
            line.strip_prefix("def ")
                .or_else(|| line.strip_prefix("async def "))
        })
        .filter_map(|rest| rest.split('(').next())
        .map(str::trim)
        .filter(|name| name.starts_with("test"))
        .map(str::to_string)
        .collect()
}

fn without_host_definition(code: &str) -> String {
    code.lines()
        .filter(|line| !is_host_assignment(line))
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct SuiteComposer {
    provider: Arc<dyn ModelProviderClient>,
    settings: StageSettings,
    override_var: String,
}

impl SuiteComposer {
    pub fn new(provider: Arc<dyn ModelProviderClient>, settings: StageSettings) -> Self {
        Self::with_override_var(provider, settings, DEFAULT_HOST_OVERRIDE_VAR)
    }

    pub fn with_override_var(
        provider: Arc<dyn ModelProviderClient>,
        settings: StageSettings,
        override_var: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            settings,
            override_var: override_var.into(),
        }
    }

    pub async fn try_compose(
        &self,
        units: &[TestUnit],
        target_host: &str,
    ) -> Result<String, StageError> {
        if units.is_empty() {
            return Ok(module_header(target_host, &self.override_var));
        }

        let functions: Vec<&str> = units.iter().map(|unit| unit.code.as_str()).collect();
        let reply = request_completion(
            self.provider.as_ref(),
            &self.settings,
            "compose",
            SYSTEM_PROMPT.to_string(),
            format!("Test functions:\n{}", functions.join("\n\n")),
        )
        .await?;

        let extracted = extract_code(&reply)?;
        let code = without_host_definition(&extracted.code);

        let expected: Vec<&str> = units.iter().map(|u| u.function_name.as_str()).collect();
        let found = test_function_names(&code);
        if found != expected {
            return Err(StageError::SchemaValidation(format!(
                "composed module defines {:?}, expected {:?}",
                found, expected
            )));
        }

        info!(branch = ?extracted.branch, functions = found.len(), "Suite composed");
        Ok(format!(
            "{}{}",
            module_header(target_host, &self.override_var),
            code
        ))
    }
}

#[async_trait]
impl SuiteComposition for SuiteComposer {
    async fn compose(&self, units: &[TestUnit], target_host: &str) -> StageOutcome<String> {
        match self.try_compose(units, target_host).await {
            Ok(module) => StageOutcome::Generated(module),
            Err(cause) => {
                warn!(error = %cause, "Suite composition failed, concatenating test units");
                StageOutcome::Fallback {
                    value: concatenate_units(units, target_host, &self.override_var),
                    cause,
                }
            }
        }
    }
}
