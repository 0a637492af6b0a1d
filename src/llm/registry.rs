//! Process-wide provider registry: tag → factory, guarded by a read-write
//! lock. Data-driven — the registry itself has no knowledge of which tags
//! exist; default factories are registered once, at process start, by the
//! CLI entry point (never lazily on first lookup).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{LLMConfig, Provider};
use crate::error::{Result, ShotgunError};

type Factory = Arc<dyn Fn(LLMConfig) -> Result<Arc<dyn Provider>> + Send + Sync>;

#[derive(Default)]
pub struct ProviderRegistry {
    factories: RwLock<HashMap<String, Factory>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self { factories: RwLock::new(HashMap::new()) }
    }

    /// Register (or replace) the factory for `tag`.
    pub fn register<F>(&self, tag: impl Into<String>, factory: F)
    where
        F: Fn(LLMConfig) -> Result<Arc<dyn Provider>> + Send + Sync + 'static,
    {
        let mut factories = self.factories.write().expect("provider registry lock poisoned");
        factories.insert(tag.into(), Arc::new(factory));
    }

    /// Build a provider for `cfg.provider`. Errors if the tag is unregistered.
    pub fn create(&self, cfg: LLMConfig) -> Result<Arc<dyn Provider>> {
        let factories = self.factories.read().expect("provider registry lock poisoned");
        let factory = factories
            .get(cfg.provider.as_str())
            .ok_or_else(|| ShotgunError::UnknownProvider(cfg.provider.clone()))?
            .clone();
        drop(factories);
        factory(cfg)
    }

    pub fn supported_providers(&self) -> Vec<String> {
        let factories = self.factories.read().expect("provider registry lock poisoned");
        let mut tags: Vec<String> = factories.keys().cloned().collect();
        tags.sort();
        tags
    }
}

/// Register the four built-in providers. Call exactly once, from the CLI
/// entry point's `main` (or explicitly, by any embedder) — never lazily at
/// first lookup, so registry state never depends on which code path ran
/// first.
pub fn register_default_providers(registry: &ProviderRegistry) {
    registry.register("openai", |cfg| {
        super::openai::OpenAIProvider::new(cfg).map(|p| Arc::new(p) as Arc<dyn Provider>)
    });
    registry.register("anthropic", |cfg| {
        super::anthropic::AnthropicProvider::new(cfg).map(|p| Arc::new(p) as Arc<dyn Provider>)
    });
    registry.register("gemini", |cfg| {
        super::gemini::GeminiProvider::new(cfg).map(|p| Arc::new(p) as Arc<dyn Provider>)
    });
    registry.register("subprocess", |cfg| {
        super::subprocess::SubprocessProvider::new(cfg).map(|p| Arc::new(p) as Arc<dyn Provider>)
    });
}
