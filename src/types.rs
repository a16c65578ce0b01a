//! Records handed from stage to stage: requirement, scenario, test unit.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One acceptance criterion lifted from the spec document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: String,
    pub title: String,
    pub description: String,
}

/// Wrapper used for structured extraction replies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementList {
    pub requirements: Vec<Requirement>,
}

/// A requirement elaborated into steps, expected result and test data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestScenario {
    pub requirement_id: String,
    pub scenario_id: String,
    pub description: String,
    pub steps: Vec<String>,
    pub expected_result: String,
    #[serde(default)]
    pub test_data: BTreeMap<String, Value>,
}

/// One generated pytest function plus its metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestUnit {
    pub requirement_id: String,
    pub scenario_id: String,
    #[serde(alias = "test_function_name")]
    pub function_name: String,
    pub code: String,
    pub description: String,
}

/// True for a Python identifier usable as a pytest function name.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
