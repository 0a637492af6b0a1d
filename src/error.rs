//! Crate-wide error type.
//!
//! Every fallible operation in the core returns [`Result<T>`], a thin alias
//! over `std::result::Result<T, ShotgunError>`. `ShotgunError` has one
//! variant per error kind in the design document; pipeline boundaries
//! (scan/generate/send) wrap leaf errors with a stage prefix rather than
//! each leaf knowing its caller's stage name.

use std::path::PathBuf;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, ShotgunError>;

#[derive(Debug, thiserror::Error)]
pub enum ShotgunError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("not found: {0}")]
    NotFound(PathBuf),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("template error: {0}")]
    TemplateError(String),

    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("provider configuration error: {0}")]
    ProviderConfigError(String),

    #[error("provider returned HTTP {status}: {message}")]
    ProviderHttpError { status: u16, message: String },

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("operation cancelled")]
    Cancelled,

    #[error("failed to save response: {0}")]
    SaveError(String),

    #[error("unregistered provider: {0}")]
    UnknownProvider(String),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl ShotgunError {
    /// Whether a caller may reasonably retry the operation unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            ShotgunError::ProviderHttpError { status, .. } => {
                *status == 429 || (500..600).contains(status)
            }
            ShotgunError::Timeout(_) => true,
            ShotgunError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Suggested backoff before retrying, for errors where the caller
    /// doesn't already have its own backoff schedule. `429`/5xx get the
    /// same 429-response default most providers document when no
    /// `Retry-After` header is present; other retryable kinds back off on
    /// a short flat delay.
    pub fn retry_delay(&self) -> Option<Duration> {
        match self {
            ShotgunError::ProviderHttpError { status, .. } if *status == 429 => {
                Some(Duration::from_secs(1))
            }
            ShotgunError::ProviderHttpError { status, .. } if (500..600).contains(status) => {
                Some(Duration::from_millis(500))
            }
            ShotgunError::Timeout(_) => Some(Duration::from_millis(500)),
            ShotgunError::Http(e) if e.is_timeout() || e.is_connect() => Some(Duration::from_millis(500)),
            _ => None,
        }
    }

    /// Wrap this error with a pipeline stage prefix, per the "scan failed: …"
    /// / "generation failed: …" / "LLM request failed: …" convention.
    pub fn with_stage(self, stage: &str) -> ShotgunError {
        match self {
            ShotgunError::InvalidConfig(m) => {
                ShotgunError::InvalidConfig(format!("{stage} failed: {m}"))
            }
            ShotgunError::Io(e) => ShotgunError::Io(std::io::Error::new(
                e.kind(),
                format!("{stage} failed: {e}"),
            )),
            ShotgunError::LimitExceeded(m) => {
                ShotgunError::LimitExceeded(format!("{stage} failed: {m}"))
            }
            ShotgunError::TemplateError(m) => {
                ShotgunError::TemplateError(format!("{stage} failed: {m}"))
            }
            other => other,
        }
    }
}
