//! Anthropic Messages API provider.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;

use super::{HttpBase, LLMConfig, LLMResult, Provider, Usage};
use crate::cancel::CancellationToken;
use crate::error::{Result, ShotgunError};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

pub struct AnthropicProvider {
    config: LLMConfig,
    http: HttpBase,
}

impl AnthropicProvider {
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
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: Option<u64>,
    output_tokens: Option<u64>,
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn is_configured(&self) -> bool {
        !self.config.api_key.is_empty() && !self.config.model.is_empty()
    }

    fn validate_config(&self) -> Result<()> {
        if self.config.model.is_empty() {
            return Err(ShotgunError::InvalidConfig("anthropic provider requires a model".to_string()));
        }
        if self.config.api_key.is_empty() {
            return Err(ShotgunError::ProviderConfigError("anthropic provider requires an API key".to_string()));
        }
        Ok(())
    }

    async fn send(&self, content: &str, cancel: &CancellationToken) -> Result<LLMResult> {
        self.validate_config()?;

        let body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "messages": [{"role": "user", "content": content}],
        });

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&self.config.api_key)
            .map_err(|_| ShotgunError::ProviderConfigError("api key contains invalid header characters".to_string()))?;
        headers.insert("x-api-key", key);
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));

        let url = format!("{}/v1/messages", self.base_url());
        tracing::debug!(provider = "anthropic", model = %self.config.model, "dispatching request");

        let start = Instant::now();
        let raw_response = self.http.post_json(&url, headers, body, cancel).await?;
        let parsed: MessagesResponse = serde_json::from_str(&raw_response)?;

        let response = parsed
            .content
            .iter()
            .filter(|b| b.block_type == "text")
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .concat();
        let usage = parsed.usage.map(|u| Usage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
            total_tokens: match (u.input_tokens, u.output_tokens) {
                (Some(i), Some(o)) => Some(i + o),
                _ => None,
            },
        });

        Ok(LLMResult {
            response,
            raw_response,
            model: self.config.model.clone(),
            provider_name: "anthropic".to_string(),
            duration: start.elapsed(),
            usage,
        })
    }
}
