//! Application service: the two entry points a front-end (CLI or otherwise)
//! drives — generating a context document and dispatching it to an LLM.

use std::path::PathBuf;

use crate::cancel::CancellationToken;
use crate::error::{Result, ShotgunError};
use crate::generator::{ContextGenerator, GenerateConfig, GenerateResult};
use crate::llm::registry::ProviderRegistry;
use crate::llm::{LLMConfig, LLMResult};
use crate::progress::ProgressSink;

pub struct ApplicationService<'a> {
    registry: &'a ProviderRegistry,
}

impl<'a> ApplicationService<'a> {
    pub fn new(registry: &'a ProviderRegistry) -> Self {
        Self { registry }
    }

    /// Validate `cfg.root_path` (must exist, must be a directory,
    /// canonicalized), run the scan/generate pipeline, write the result to
    /// `cfg.output_path` (a timestamped default path if unset), and return
    /// it.
    pub fn generate(&self, mut cfg: GenerateConfig) -> Result<GenerateResult> {
        self.generate_with_progress(&mut cfg, None, &CancellationToken::new())
    }

    pub fn generate_with_progress(
        &self,
        cfg: &mut GenerateConfig,
        sink: Option<&dyn ProgressSink>,
        cancel: &CancellationToken,
    ) -> Result<GenerateResult> {
        let canonical = std::fs::canonicalize(&cfg.root_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ShotgunError::NotFound(cfg.root_path.clone())
            } else {
                ShotgunError::Io(e)
            }
        })?;
        if !canonical.is_dir() {
            return Err(ShotgunError::NotADirectory(canonical));
        }
        cfg.root_path = canonical;

        let output_path = cfg.output_path.clone().unwrap_or_else(default_output_path);

        let mut result = ContextGenerator::generate_with_progress(cfg, sink, cancel)?;
        std::fs::write(&output_path, &result.content).map_err(ShotgunError::Io)?;
        result.output_path = Some(output_path);

        Ok(result)
    }

    /// Build the configured provider, validate it, check availability, and
    /// dispatch `content`. If `save_response` is set and `output_path` is
    /// non-empty, also persist the response text — a save failure still
    /// returns the in-memory result alongside the error so the caller can
    /// present the answer even when persistence fails.
    pub async fn send_to_llm_with_progress(
        &self,
        content: &str,
        llm_config: LLMConfig,
        save_response: bool,
        output_path: Option<&PathBuf>,
        sink: Option<&dyn ProgressSink>,
        cancel: &CancellationToken,
    ) -> (Option<LLMResult>, Result<()>) {
        let provider = match self.registry.create(llm_config) {
            Ok(p) => p,
            Err(e) => return (None, Err(e)),
        };
        if let Err(e) = provider.validate_config() {
            return (None, Err(e));
        }
        if !provider.is_available() {
            return (None, Err(ShotgunError::ProviderUnavailable(provider.name().to_string())));
        }

        let result = match provider.send_with_progress(content, sink, cancel).await {
            Ok(r) => r,
            Err(e) => return (None, Err(e)),
        };

        if save_response {
            if let Some(path) = output_path.filter(|p| !p.as_os_str().is_empty()) {
                if let Err(e) = std::fs::write(path, &result.response) {
                    let save_err = ShotgunError::SaveError(e.to_string());
                    return (Some(result), Err(save_err));
                }
            }
        }

        (Some(result), Ok(()))
    }
}

fn default_output_path() -> PathBuf {
    let timestamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
    PathBuf::from(format!("shotgun-context-{timestamp}.md"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::registry::register_default_providers;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn generate_rejects_missing_root() {
        let registry = ProviderRegistry::new();
        let service = ApplicationService::new(&registry);
        let cfg = GenerateConfig { root_path: PathBuf::from("/does/not/exist"), ..Default::default() };
        let err = service.generate(cfg).unwrap_err();
        assert!(matches!(err, ShotgunError::NotFound(_)));
    }

    #[test]
    fn generate_writes_to_default_output_path() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hi").unwrap();

        let registry = ProviderRegistry::new();
        let service = ApplicationService::new(&registry);

        let mut vars = HashMap::new();
        vars.insert("TASK".to_string(), "go".to_string());
        let cfg = GenerateConfig { root_path: dir.path().to_path_buf(), template_vars: vars, ..Default::default() };

        let result = service.generate(cfg).unwrap();
        let output_path = result.output_path.clone().unwrap();
        assert!(output_path.exists());
        std::fs::remove_file(output_path).unwrap();
    }

    #[tokio::test]
    async fn send_to_llm_errors_on_unregistered_provider() {
        let registry = ProviderRegistry::new();
        register_default_providers(&registry);
        let service = ApplicationService::new(&registry);
        let cfg = LLMConfig { provider: "does-not-exist".to_string(), ..Default::default() };
        let (result, err) =
            service.send_to_llm_with_progress("hi", cfg, false, None, None, &CancellationToken::new()).await;
        assert!(result.is_none());
        assert!(err.is_err());
    }
}
