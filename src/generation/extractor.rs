//! Requirement extraction: spec document → ordered requirement records.

use crate::error::StageError;
use crate::generation::schema::{format_instructions, parse_requirements, REQUIREMENT_LIST_SCHEMA};
use crate::generation::{request_completion, RequirementExtraction, StageOutcome, StageSettings};
use crate::provider::ModelProviderClient;
use crate::types::Requirement;
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

const SYSTEM_PROMPT: &str = "You are an expert business analyst. Extract every functional \
requirement and acceptance criterion from the markdown specification you are given, in the \
order they appear. Keep each identifier exactly as written in the document.";

/// `### AC-<code>: <title>` on its own line.
fn heading_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^###[ \t]+(AC-\w+):[ \t]+(.+)$").expect("heading pattern is valid")
    })
}

/// Deterministic heading parser used when the service cannot extract requirements.
///
/// A requirement body runs from the line after its heading to the next matching heading
/// or end of text, trimmed. Other headings stay inside the body.
pub fn parse_headings(document: &str) -> Vec<Requirement> {
    let headings: Vec<_> = heading_pattern().captures_iter(document).collect();

    headings
        .iter()
        .enumerate()
        .map(|(index, caps)| {
            let heading = caps.get(0).map(|m| m.end()).unwrap_or_default();
            let body_end = headings
                .get(index + 1)
                .and_then(|next| next.get(0))
                .map(|m| m.start())
                .unwrap_or(document.len());
            Requirement {
                id: caps[1].trim().to_string(),
                title: caps[2].trim().to_string(),
                description: document[heading..body_end].trim().to_string(),
            }
        })
        .collect()
}

pub struct RequirementExtractor {
    provider: Arc<dyn ModelProviderClient>,
    settings: StageSettings,
}

impl RequirementExtractor {
    pub fn new(provider: Arc<dyn ModelProviderClient>, settings: StageSettings) -> Self {
        Self { provider, settings }
    }

    pub async fn try_extract(&self, document: &str) -> Result<Vec<Requirement>, StageError> {
        let user_prompt = format!(
            "Markdown specification:\n{}\n\n{}",
            document,
            format_instructions(REQUIREMENT_LIST_SCHEMA)
        );
        let reply = request_completion(
            self.provider.as_ref(),
            &self.settings,
            "extract",
            SYSTEM_PROMPT.to_string(),
            user_prompt,
        )
        .await?;
        parse_requirements(&reply)
    }
}

#[async_trait]
impl RequirementExtraction for RequirementExtractor {
    async fn extract(&self, document: &str) -> StageOutcome<Vec<Requirement>> {
        match self.try_extract(document).await {
            Ok(requirements) => {
                info!(count = requirements.len(), "Requirements extracted");
                StageOutcome::Generated(requirements)
            }
            Err(cause) => {
                let requirements = parse_headings(document);
                warn!(
                    error = %cause,
                    count = requirements.len(),
                    "Requirement extraction failed, using heading parser"
                );
                StageOutcome::Fallback {
                    value: requirements,
                    cause,
                }
            }
        }
    }
}
