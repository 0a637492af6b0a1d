//! OpenAI-compatible chat-completions provider.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;

use super::{HttpBase, LLMConfig, LLMResult, Provider, Usage};
use crate::cancel::CancellationToken;
use crate::error::{Result, ShotgunError};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAIProvider {
    config: LLMConfig,
    http: HttpBase,
}

impl OpenAIProvider {
    pub fn new(config: LLMConfig) -> Result<Self> {
        let timeout = config.timeout_seconds;
        Ok(Self { config, http: HttpBase::new(timeout)? })
    }

    fn base_url(&self) -> &str {
        if self.config.base_url.is_empty() {
            DEFAULT_BASE_URL
        } else {
            &self.config.base_url
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
    total_tokens: Option<u64>,
}

#[async_trait]
impl Provider for OpenAIProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn is_configured(&self) -> bool {
        !self.config.api_key.is_empty() && !self.config.model.is_empty()
    }

    fn validate_config(&self) -> Result<()> {
        if self.config.model.is_empty() {
            return Err(ShotgunError::InvalidConfig("openai provider requires a model".to_string()));
        }
        if self.config.api_key.is_empty() {
            return Err(ShotgunError::ProviderConfigError("openai provider requires an API key".to_string()));
        }
        Ok(())
    }

    async fn send(&self, content: &str, cancel: &CancellationToken) -> Result<LLMResult> {
        self.validate_config()?;

        let mut body = serde_json::json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": content}],
        });
        if let Some(max_tokens) = self.config.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.config.api_key))
            .map_err(|_| ShotgunError::ProviderConfigError("api key contains invalid header characters".to_string()))?;
        headers.insert(AUTHORIZATION, auth);

        let url = format!("{}/chat/completions", self.base_url());
        tracing::debug!(provider = "openai", model = %self.config.model, "dispatching request");

        let start = Instant::now();
        let raw_response = self.http.post_json(&url, headers, body, cancel).await?;
        let parsed: ChatResponse = serde_json::from_str(&raw_response)?;

        let response = parsed.choices.into_iter().next().map(|c| c.message.content).unwrap_or_default();
        let usage = parsed.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(LLMResult {
            response,
            raw_response,
            model: self.config.model.clone(),
            provider_name: "openai".to_string(),
            duration: start.elapsed(),
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_config_requires_key_and_model() {
        let provider = OpenAIProvider::new(LLMConfig::default()).unwrap();
        assert!(provider.validate_config().is_err());
    }

    #[test]
    fn is_configured_requires_key_and_model() {
        let provider = OpenAIProvider::new(LLMConfig {
            api_key: "sk-test".to_string(),
            model: "gpt-4o".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert!(provider.is_configured());
    }
}
