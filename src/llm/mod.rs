//! LLM provider abstraction: a common `Provider` trait plus a shared HTTP
//! base (single reused `reqwest::Client`, retry-with-backoff on 429/5xx)
//! that the OpenAI-, Anthropic-, and Gemini-style REST providers build on.

pub mod anthropic;
pub mod gemini;
pub mod openai;
pub mod registry;
pub mod subprocess;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;

use crate::cancel::CancellationToken;
use crate::error::{Result, ShotgunError};
use crate::progress::{Progress, ProgressSink};

/// Per-HTTP-call timeout when `LLMConfig.timeout_seconds` is unset (0).
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300;

/// Configuration shared by every provider. Sub-process-only fields
/// (`binary_path`, `browser_refresh`) are ignored by the HTTP providers.
#[derive(Debug, Clone, Default)]
pub struct LLMConfig {
    pub provider: String,
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
    pub max_tokens: Option<u32>,
    pub binary_path: Option<String>,
    pub browser_refresh: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Usage {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct LLMResult {
    pub response: String,
    pub raw_response: String,
    pub model: String,
    pub provider_name: String,
    pub duration: Duration,
    pub usage: Option<Usage>,
}

/// Every provider implements this; `Arc<dyn Provider>` is what the registry
/// hands back.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the provider has the credentials/settings it needs to run.
    fn is_configured(&self) -> bool;

    /// Whether the provider is reachable right now (for HTTP providers this
    /// defaults to `is_configured`; the sub-process provider overrides it to
    /// check binary discovery).
    fn is_available(&self) -> bool {
        self.is_configured()
    }

    fn validate_config(&self) -> Result<()>;

    async fn send(&self, content: &str, cancel: &CancellationToken) -> Result<LLMResult>;

    /// Default implementation wraps [`send`](Provider::send) with the two
    /// coarse stage emissions every HTTP provider shares; the sub-process
    /// provider overrides this for its extra stages.
    async fn send_with_progress(
        &self,
        content: &str,
        sink: Option<&dyn ProgressSink>,
        cancel: &CancellationToken,
    ) -> Result<LLMResult> {
        cancel.check()?;
        crate::progress::emit(
            sink,
            Progress::new(0, -1, "connecting", format!("Connecting to {}…", self.name())),
        );
        let result = self.send(content, cancel).await?;
        crate::progress::emit(sink, Progress::new(1, 1, "complete", "Response received"));
        Ok(result)
    }
}

impl std::fmt::Debug for dyn Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider").field("name", &self.name()).finish()
    }
}

/// Shared HTTP plumbing: one client per provider instance, exponential
/// backoff retry on 429/5xx, bounded by a small fixed retry count.
pub(crate) struct HttpBase {
    client: reqwest::Client,
    max_retries: u32,
}

impl HttpBase {
    pub(crate) fn new(timeout_seconds: u64) -> Result<Self> {
        let timeout = if timeout_seconds == 0 { DEFAULT_TIMEOUT_SECONDS } else { timeout_seconds };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .map_err(ShotgunError::Http)?;
        Ok(Self { client, max_retries: 3 })
    }

    /// POST `body` to `url` with `headers`. Returns the response body text
    /// on any 2xx status. Retries on 429/5xx and on transient transport
    /// errors (timeout/connect), up to `max_retries` times. Checked against
    /// `cancel` before each attempt and before each backoff sleep, so a
    /// cancellation request aborts an in-flight retry loop rather than
    /// running it to completion.
    pub(crate) async fn post_json(
        &self,
        url: &str,
        headers: HeaderMap,
        body: serde_json::Value,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let mut last_error: Option<ShotgunError> = None;

        for attempt in 0..=self.max_retries {
            cancel.check()?;
            if attempt > 0 {
                let delay = Duration::from_millis(100 * 2_u64.pow(attempt - 1));
                tokio::time::sleep(delay).await;
                cancel.check()?;
            }

            let sent = self.client.post(url).headers(headers.clone()).json(&body).send().await;
            match sent {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return resp.text().await.map_err(ShotgunError::Http);
                    }
                    let body_text = resp.text().await.unwrap_or_default();
                    let err = ShotgunError::ProviderHttpError { status: status.as_u16(), message: body_text };
                    if err.is_retryable() && attempt < self.max_retries {
                        tracing::warn!(status = status.as_u16(), attempt, "provider returned retryable status");
                        last_error = Some(err);
                        continue;
                    }
                    return Err(err);
                }
                Err(e) => {
                    let err = ShotgunError::Http(e);
                    if err.is_retryable() && attempt < self.max_retries {
                        last_error = Some(err);
                        continue;
                    }
                    return Err(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ShotgunError::ProviderUnavailable(url.to_string())))
    }
}
