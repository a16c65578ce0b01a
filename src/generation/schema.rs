//! Structured output: schema text sent to the service and the validating parse of its reply.

use crate::error::StageError;
use crate::generation::composer::test_function_names;
use crate::generation::fence::{fenced_blocks, first_tagged};
use crate::types::{is_valid_identifier, Requirement, RequirementList, TestScenario, TestUnit};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;

pub const REQUIREMENT_LIST_SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "requirements": {
      "type": "array",
      "items": {
        "type": "object",
        "properties": {
          "id": {"type": "string", "description": "Acceptance criterion identifier, e.g. AC-1"},
          "title": {"type": "string"},
          "description": {"type": "string"}
        },
        "required": ["id", "title", "description"]
      }
    }
  },
  "required": ["requirements"]
}"#;

pub const TEST_SCENARIO_SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "requirement_id": {"type": "string"},
    "scenario_id": {"type": "string"},
    "description": {"type": "string"},
    "steps": {"type": "array", "items": {"type": "string"}},
    "expected_result": {"type": "string"},
    "test_data": {"type": "object"}
  },
  "required": ["requirement_id", "scenario_id", "description", "steps", "expected_result"]
}"#;

pub const TEST_UNIT_SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "requirement_id": {"type": "string"},
    "scenario_id": {"type": "string"},
    "function_name": {"type": "string", "description": "pytest function name, must start with test_"},
    "code": {"type": "string", "description": "Complete function definition; BASE_URL is provided by the module"},
    "description": {"type": "string"}
  },
  "required": ["requirement_id", "scenario_id", "function_name", "code", "description"]
}"#;

/// Instructions appended to user prompts so the reply is a single JSON instance of `schema`.
pub fn format_instructions(schema: &str) -> String {
    format!(
        "The output must be formatted as a JSON instance that conforms to the JSON schema below. \
         Reply with the JSON only.\n\n```\n{}\n```",
        schema
    )
}

/// Record-level checks run after deserialization
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

impl Validate for Requirement {
    fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("requirement id is empty".to_string());
        }
        if self.title.trim().is_empty() {
            return Err(format!("requirement {} has an empty title", self.id));
        }
        Ok(())
    }
}

impl Validate for Vec<Requirement> {
    fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for requirement in self {
            requirement.validate()?;
            if !seen.insert(requirement.id.as_str()) {
                return Err(format!("duplicate requirement id {}", requirement.id));
            }
        }
        Ok(())
    }
}

impl Validate for TestScenario {
    fn validate(&self) -> Result<(), String> {
        if self.scenario_id.trim().is_empty() {
            return Err("scenario_id is empty".to_string());
        }
        if self.steps.is_empty() {
            return Err(format!("scenario {} has no steps", self.scenario_id));
        }
        if self.expected_result.trim().is_empty() {
            return Err(format!(
                "scenario {} has no expected result",
                self.scenario_id
            ));
        }
        Ok(())
    }
}

impl Validate for TestUnit {
    fn validate(&self) -> Result<(), String> {
        if !is_valid_identifier(&self.function_name) {
            return Err(format!(
                "function_name {:?} is not a valid identifier",
                self.function_name
            ));
        }
        if !self.function_name.starts_with("test") {
            return Err(format!(
                "function_name {:?} is not collected by pytest; it must start with 'test'",
                self.function_name
            ));
        }
        let defined = test_function_names(&self.code);
        if defined != [self.function_name.as_str()] {
            return Err(format!(
                "code must define exactly one top-level test function {}, found {:?}",
                self.function_name, defined
            ));
        }
        Ok(())
    }
}

/// Locate the JSON payload in a reply: a `json` fence, then any fence holding JSON,
/// then the outermost object/array span.
pub fn locate_json(reply: &str) -> Option<&str> {
    if let Some(block) = first_tagged(reply, &["json"]) {
        return Some(block.body.trim());
    }
    if let Some(block) = fenced_blocks(reply).into_iter().find(|b| {
        let body = b.body.trim_start();
        body.starts_with('{') || body.starts_with('[')
    }) {
        return Some(block.body.trim());
    }

    let start = reply.find(|c: char| c == '{' || c == '[')?;
    let closing = if reply[start..].starts_with('{') { '}' } else { ']' };
    let end = reply.rfind(closing)?;
    (end > start).then(|| &reply[start..=end])
}

/// Deserialize and validate one structured record.
pub fn parse_structured<T>(reply: &str) -> Result<T, StageError>
where
    T: DeserializeOwned + Validate,
{
    let payload = locate_json(reply)
        .ok_or_else(|| StageError::SchemaValidation("reply contains no JSON".to_string()))?;
    let record: T = serde_json::from_str(payload)
        .map_err(|e| StageError::SchemaValidation(e.to_string()))?;
    record.validate().map_err(StageError::SchemaValidation)?;
    Ok(record)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RequirementReply {
    Wrapped(RequirementList),
    Bare(Vec<Requirement>),
}

/// Requirements arrive either wrapped (`{"requirements": [...]}`) or as a bare list.
pub fn parse_requirements(reply: &str) -> Result<Vec<Requirement>, StageError> {
    let payload = locate_json(reply)
        .ok_or_else(|| StageError::SchemaValidation("reply contains no JSON".to_string()))?;
    let parsed: RequirementReply = serde_json::from_str(payload)
        .map_err(|e| StageError::SchemaValidation(e.to_string()))?;
    let requirements = match parsed {
        RequirementReply::Wrapped(list) => list.requirements,
        RequirementReply::Bare(list) => list,
    };
    requirements
        .validate()
        .map_err(StageError::SchemaValidation)?;
    Ok(requirements)
}
