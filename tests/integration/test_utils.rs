//! Shared test utilities for integration tests
//!
//! A scripted generation service, sample documents, and serialized access to the
//! process environment (HOME, OPENAI_API_KEY, AXIOM_*).

use async_trait::async_trait;
use axiom::error::ApiError;
use axiom::provider::{
    ChatMessage, CompletionOptions, CompletionResponse, ModelProviderClient, TokenUsage,
};
use std::collections::VecDeque;
use std::sync::Mutex;
use tempfile::TempDir;

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

pub const PROFILE_SPEC: &str = "# Profile API\n\n\
### AC-1: Read profile\n\
A user with a valid bearer token can read their profile.\n\n\
### AC-2: Update email\n\
A user can change the email address on their profile.\n";

/// Replies handed out in call order; an exhausted script fails every further call.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Fails every call.
    pub fn offline() -> Self {
        Self::new(Vec::new())
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompt(&self, index: usize) -> Vec<ChatMessage> {
        self.prompts.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl ModelProviderClient for ScriptedProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        _options: CompletionOptions,
    ) -> Result<CompletionResponse, ApiError> {
        self.prompts.lock().unwrap().push(messages);
        let next = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("service unavailable".to_string()));
        match next {
            Ok(content) => Ok(CompletionResponse {
                content,
                model: "scripted".to_string(),
                usage: TokenUsage::default(),
                finish_reason: Some("stop".to_string()),
            }),
            Err(message) => Err(ApiError::ProviderRequestFailed(message)),
        }
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

pub fn requirements_reply(items: &[(&str, &str)]) -> Result<String, String> {
    let requirements: Vec<_> = items
        .iter()
        .map(|(id, title)| serde_json::json!({"id": id, "title": title, "description": title}))
        .collect();
    Ok(serde_json::json!({ "requirements": requirements }).to_string())
}

pub fn scenario_reply(requirement_id: &str) -> Result<String, String> {
    Ok(format!(
        "```json\n{}\n```",
        serde_json::json!({
            "requirement_id": requirement_id,
            "scenario_id": format!("SCN-{}", requirement_id),
            "description": "happy path",
            "steps": ["Given a token", "When the request is sent", "Then it succeeds"],
            "expected_result": "200 OK",
            "test_data": {"token": "abc"}
        })
    ))
}

pub fn unit_reply(function_name: &str, code: &str) -> Result<String, String> {
    Ok(serde_json::json!({
        "requirement_id": "ignored",
        "scenario_id": "ignored",
        "function_name": function_name,
        "code": code,
        "description": "generated",
    })
    .to_string())
}

/// Run `f` with HOME pointed into `test_dir` and OPENAI_API_KEY / AXIOM_ENV cleared,
/// restoring everything afterwards.
pub fn with_isolated_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(&str, Option<String>)> = ["HOME", "OPENAI_API_KEY", "AXIOM_ENV"]
        .into_iter()
        .map(|key| (key, std::env::var(key).ok()))
        .collect();

    let home = test_dir.path().join("home");
    std::fs::create_dir_all(&home).unwrap();
    std::env::set_var("HOME", &home);
    std::env::remove_var("OPENAI_API_KEY");
    std::env::remove_var("AXIOM_ENV");

    let result = f();

    for (key, value) in saved {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
    result
}
