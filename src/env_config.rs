//! CLI-only environment credential loading. The library core never reads
//! the environment; this exists so the CLI binary can populate an
//! `LLMConfig` without forcing the user to pass `--api-key` explicitly.

use crate::llm::LLMConfig;

/// Fill in `api_key` (and `base_url`/`timeout_seconds` if unset) from
/// environment variables matching `cfg.provider`. Explicit CLI flags should
/// be applied to `cfg` before calling this, since they take precedence.
pub fn apply_env_fallbacks(mut cfg: LLMConfig) -> LLMConfig {
    if cfg.api_key.is_empty() {
        let key_var = match cfg.provider.as_str() {
            "openai" => Some("OPENAI_API_KEY"),
            "anthropic" => Some("ANTHROPIC_API_KEY"),
            "gemini" => Some("GEMINI_API_KEY"),
            _ => None,
        };
        if let Some(var) = key_var {
            if let Ok(value) = std::env::var(var) {
                cfg.api_key = value;
            }
        }
    }

    if cfg.base_url.is_empty() {
        if let Ok(value) = std::env::var("SHOTGUN_BASE_URL") {
            cfg.base_url = value;
        }
    }

    if cfg.timeout_seconds == 0 {
        if let Ok(value) = std::env::var("SHOTGUN_TIMEOUT_SECONDS") {
            if let Ok(parsed) = value.parse() {
                cfg.timeout_seconds = parsed;
            }
        }
    }

    cfg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_api_key_is_not_overwritten() {
        std::env::set_var("OPENAI_API_KEY", "from-env");
        let cfg = LLMConfig { provider: "openai".to_string(), api_key: "from-flag".to_string(), ..Default::default() };
        let resolved = apply_env_fallbacks(cfg);
        assert_eq!(resolved.api_key, "from-flag");
        std::env::remove_var("OPENAI_API_KEY");
    }

    #[test]
    fn missing_api_key_falls_back_to_env() {
        std::env::set_var("ANTHROPIC_API_KEY", "from-env-2");
        let cfg = LLMConfig { provider: "anthropic".to_string(), ..Default::default() };
        let resolved = apply_env_fallbacks(cfg);
        assert_eq!(resolved.api_key, "from-env-2");
        std::env::remove_var("ANTHROPIC_API_KEY");
    }
}
