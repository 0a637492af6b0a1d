//! Gemini REST (`generateContent`) provider. The API key travels in the
//! query string rather than an auth header.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Deserialize;

use super::{HttpBase, LLMConfig, LLMResult, Provider, Usage};
use crate::cancel::CancellationToken;
use crate::error::{Result, ShotgunError};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiProvider {
    config: LLMConfig,
    http: HttpBase,
}

impl GeminiProvider {
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
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata", default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: Option<u64>,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: Option<u64>,
    #[serde(rename = "totalTokenCount")]
    total_token_count: Option<u64>,
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn is_configured(&self) -> bool {
        !self.config.api_key.is_empty() && !self.config.model.is_empty()
    }

    fn validate_config(&self) -> Result<()> {
        if self.config.model.is_empty() {
            return Err(ShotgunError::InvalidConfig("gemini provider requires a model".to_string()));
        }
        if self.config.api_key.is_empty() {
            return Err(ShotgunError::ProviderConfigError("gemini provider requires an API key".to_string()));
        }
        Ok(())
    }

    async fn send(&self, content: &str, cancel: &CancellationToken) -> Result<LLMResult> {
        self.validate_config()?;

        let mut body = serde_json::json!({
            "contents": [{"parts": [{"text": content}]}],
        });
        if let Some(max_tokens) = self.config.max_tokens {
            body["generationConfig"] = serde_json::json!({ "maxOutputTokens": max_tokens });
        }

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url(),
            self.config.model,
            self.config.api_key
        );
        tracing::debug!(provider = "gemini", model = %self.config.model, "dispatching request");

        let start = Instant::now();
        let raw_response = self.http.post_json(&url, HeaderMap::new(), body, cancel).await?;
        let parsed: GenerateContentResponse = serde_json::from_str(&raw_response)?;

        let response = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().map(|p| p.text).collect::<Vec<_>>().concat())
            .unwrap_or_default();
        let usage = parsed.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        Ok(LLMResult {
            response,
            raw_response,
            model: self.config.model.clone(),
            provider_name: "gemini".to_string(),
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
        let provider = GeminiProvider::new(LLMConfig::default()).unwrap();
        assert!(provider.validate_config().is_err());
    }
}
