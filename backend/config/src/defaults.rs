//! Config defaults applied after loading.

use crate::schema::{LoggingConfig, ProviderConfig, RouterConfig};

pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const DEFAULT_LOG_DIR: &str = "logs";

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

pub const DEFAULT_OPENROUTER_URL: &str = "https://openrouter.ai/api/v1";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: RouterConfig) -> RouterConfig {
    let config = apply_logging_defaults(config);
    let config = apply_provider_defaults(config);
    apply_default_provider(config)
}

fn apply_logging_defaults(mut config: RouterConfig) -> RouterConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.dir.get_or_insert_with(|| DEFAULT_LOG_DIR.to_string());
    logging.json.get_or_insert(false);
    config
}

/// Fill in provider base URLs.
fn apply_provider_defaults(mut config: RouterConfig) -> RouterConfig {
    for provider in config.providers.values_mut() {
        match provider {
            ProviderConfig::Ollama { base_url, .. } => {
                base_url.get_or_insert_with(|| DEFAULT_OLLAMA_URL.to_string());
            }
            ProviderConfig::OpenRouter { base_url, .. } => {
                base_url.get_or_insert_with(|| DEFAULT_OPENROUTER_URL.to_string());
            }
            ProviderConfig::Mock { .. } => {}
        }
    }
    config
}

/// A single configured provider becomes the default one.
fn apply_default_provider(mut config: RouterConfig) -> RouterConfig {
    if config.default_provider.is_none() && config.providers.len() == 1 {
        config.default_provider = config.providers.keys().next().cloned();
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_logging_and_urls() {
        let mut cfg = RouterConfig::default();
        cfg.providers.insert(
            "local".into(),
            ProviderConfig::Ollama { base_url: None, model: "qwen2.5".into() },
        );
        let cfg = apply_all_defaults(cfg);

        let logging = cfg.logging.unwrap();
        assert_eq!(logging.level.as_deref(), Some(DEFAULT_LOG_LEVEL));
        assert_eq!(logging.dir.as_deref(), Some(DEFAULT_LOG_DIR));
        assert_eq!(
            cfg.providers["local"],
            ProviderConfig::Ollama {
                base_url: Some(DEFAULT_OLLAMA_URL.into()),
                model: "qwen2.5".into(),
            }
        );
        assert_eq!(cfg.default_provider.as_deref(), Some("local"));
    }

    #[test]
    fn keeps_explicit_values() {
        let mut cfg = RouterConfig::default();
        cfg.logging = Some(LoggingConfig { level: Some("debug".into()), ..Default::default() });
        cfg.providers.insert("a".into(), ProviderConfig::Mock { responses: vec![] });
        cfg.providers.insert("b".into(), ProviderConfig::Mock { responses: vec![] });
        let cfg = apply_all_defaults(cfg);
        assert_eq!(cfg.logging.unwrap().level.as_deref(), Some("debug"));
        assert!(cfg.default_provider.is_none());
    }
}
