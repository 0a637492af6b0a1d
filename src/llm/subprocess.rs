//! Sub-process provider: shells out to an external binary (e.g. a local
//! "gemini" CLI) instead of talking HTTP directly.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

use super::{LLMConfig, LLMResult, Provider};
use crate::cancel::CancellationToken;
use crate::error::{Result, ShotgunError};
use crate::progress::{Progress, ProgressSink};

/// Fixed locations checked after `binary_path` and `PATH` are exhausted.
const COMMON_LOCATIONS: &[&str] = &["/usr/local/bin/gemini", "/opt/homebrew/bin/gemini", "/usr/bin/gemini"];

pub struct SubprocessProvider {
    config: LLMConfig,
}

impl SubprocessProvider {
    pub fn new(config: LLMConfig) -> Result<Self> {
        Ok(Self { config })
    }

    /// Explicit path, then `PATH` lookup, then a fixed list of common
    /// install locations.
    fn locate_binary(&self) -> Option<PathBuf> {
        if let Some(explicit) = &self.config.binary_path {
            let path = PathBuf::from(explicit);
            if path.is_file() {
                return Some(path);
            }
        }
        if let Ok(path) = which("gemini") {
            return Some(path);
        }
        COMMON_LOCATIONS.iter().map(PathBuf::from).find(|p| p.is_file())
    }
}

/// Minimal `PATH`-search helper so this module does not need the `which`
/// crate for a single lookup.
fn which(binary: &str) -> std::result::Result<PathBuf, ()> {
    let path_var = std::env::var_os("PATH").ok_or(())?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(binary);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    Err(())
}

/// Strip ANSI escape sequences (`ESC [ ... letter`) from `text`.
fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' && chars.peek() == Some(&'[') {
            chars.next();
            for next in chars.by_ref() {
                if next.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Drop a leading three-line "Gemini" banner some CLI builds print before
/// the actual answer.
fn drop_header(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() > 3 && lines[0].trim().eq_ignore_ascii_case("gemini") {
        lines[3..].join("\n")
    } else {
        text.to_string()
    }
}

#[async_trait]
impl Provider for SubprocessProvider {
    fn name(&self) -> &'static str {
        "subprocess"
    }

    fn is_configured(&self) -> bool {
        !self.config.model.is_empty()
    }

    fn is_available(&self) -> bool {
        self.locate_binary().is_some()
    }

    fn validate_config(&self) -> Result<()> {
        if self.config.model.is_empty() {
            return Err(ShotgunError::InvalidConfig("subprocess provider requires a model".to_string()));
        }
        Ok(())
    }

    async fn send(&self, content: &str, cancel: &CancellationToken) -> Result<LLMResult> {
        self.send_with_progress(content, None, cancel).await
    }

    async fn send_with_progress(
        &self,
        content: &str,
        sink: Option<&dyn ProgressSink>,
        cancel: &CancellationToken,
    ) -> Result<LLMResult> {
        self.validate_config()?;
        cancel.check()?;

        crate::progress::emit(sink, Progress::new(0, -1, "locating_binary", "Locating binary…"));
        let binary = self
            .locate_binary()
            .ok_or_else(|| ShotgunError::ProviderUnavailable("gemini binary not found".to_string()))?;

        crate::progress::emit(sink, Progress::new(0, -1, "preparing_request", "Preparing request…"));
        let mut args = vec!["-m".to_string(), self.config.model.clone()];
        if let Some(mode) = &self.config.browser_refresh {
            args.push("--browser-refresh".to_string());
            args.push(mode.clone());
        }

        cancel.check()?;
        tracing::debug!(provider = "subprocess", binary = %binary.display(), "dispatching request");

        let start = Instant::now();
        let timeout_secs =
            if self.config.timeout_seconds == 0 { super::DEFAULT_TIMEOUT_SECONDS } else { self.config.timeout_seconds };
        let output = run(&binary, &args, content, Duration::from_secs(timeout_secs)).await?;
        cancel.check()?;

        crate::progress::emit(sink, Progress::new(0, -1, "processing_response", "Processing response…"));
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let cleaned = drop_header(&strip_ansi(&stdout)).trim().to_string();

        crate::progress::emit(sink, Progress::new(1, 1, "complete", "Response received"));

        Ok(LLMResult {
            response: cleaned,
            raw_response: stdout,
            model: self.config.model.clone(),
            provider_name: "subprocess".to_string(),
            duration: start.elapsed(),
            usage: None,
        })
    }
}

async fn run(binary: &Path, args: &[String], stdin_content: &str, timeout_dur: Duration) -> Result<std::process::Output> {
    let mut child = Command::new(binary)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(ShotgunError::Io)?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(stdin_content.as_bytes()).await.map_err(ShotgunError::Io)?;
    }

    let timeout_secs = timeout_dur.as_secs();
    timeout(timeout_dur, child.wait_with_output())
        .await
        .map_err(|_| ShotgunError::Timeout(timeout_secs))?
        .map_err(ShotgunError::Io)
}
