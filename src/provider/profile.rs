//! Provider profile: the config-file shape of a generation backend and credential resolution.

use crate::provider::{CompletionOptions, ModelProvider};
use serde::{Deserialize, Serialize};

/// Process-wide environment variable consulted when no credential is supplied.
pub const CREDENTIAL_ENV_VAR: &str = "OPENAI_API_KEY";

/// Model used when a credential is available.
pub const DEFAULT_AUTHENTICATED_MODEL: &str = "gpt-4-turbo";
/// Model used in unauthenticated mode.
pub const DEFAULT_ANONYMOUS_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAI,
    Ollama,
    Local,
}

impl Default for ProviderType {
    fn default() -> Self {
        ProviderType::OpenAI
    }
}

/// Generation backend settings as read from configuration files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub provider_type: ProviderType,

    /// Model name; when unset, chosen from whether a credential is present
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL (openai, ollama) or full endpoint (local)
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub default_options: CompletionOptions,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: ProviderType::OpenAI,
            model: None,
            api_key: None,
            endpoint: None,
            default_options: CompletionOptions::default(),
        }
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(model) = &self.model {
            if model.trim().is_empty() {
                return Err("Model name cannot be empty".to_string());
            }
        }

        if let Some(endpoint) = &self.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(format!(
                    "Endpoint must be an http(s) URL, got '{}'",
                    endpoint
                ));
            }
        }

        if self.provider_type == ProviderType::Local && self.endpoint.is_none() {
            return Err("Local provider requires an endpoint".to_string());
        }

        if let Some(temperature) = self.default_options.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(format!(
                    "Temperature must be between 0.0 and 2.0, got {}",
                    temperature
                ));
            }
        }

        Ok(())
    }

    /// Build the runtime provider. `credential` (already resolved) wins over the
    /// configured `api_key`.
    pub fn to_model_provider(&self, credential: Option<String>) -> ModelProvider {
        let api_key = credential.or_else(|| self.api_key.clone().filter(|k| !k.is_empty()));
        match self.provider_type {
            ProviderType::OpenAI => {
                let model = self.model.clone().unwrap_or_else(|| {
                    if api_key.is_some() {
                        DEFAULT_AUTHENTICATED_MODEL.to_string()
                    } else {
                        DEFAULT_ANONYMOUS_MODEL.to_string()
                    }
                });
                ModelProvider::OpenAI {
                    model,
                    api_key,
                    base_url: self.endpoint.clone(),
                }
            }
            ProviderType::Ollama => ModelProvider::Ollama {
                model: self.model.clone().unwrap_or_else(|| "llama3".to_string()),
                base_url: self.endpoint.clone(),
            },
            ProviderType::Local => ModelProvider::LocalCustom {
                model: self.model.clone().unwrap_or_else(|| "local-model".to_string()),
                endpoint: self.endpoint.clone().unwrap_or_default(),
                api_key,
            },
        }
    }
}

/// Explicit credential first, then [`CREDENTIAL_ENV_VAR`]; blank values count as absent.
pub fn resolve_credential(explicit: Option<&str>) -> Option<String> {
    explicit
        .map(str::to_string)
        .filter(|k| !k.trim().is_empty())
        .or_else(|| {
            std::env::var(CREDENTIAL_ENV_VAR)
                .ok()
                .filter(|k| !k.trim().is_empty())
        })
}
