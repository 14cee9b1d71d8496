//! Router configuration schema.
//!
//! Keys are snake_case to match the host's plugin config convention.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root configuration for the command router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Route ordinary messages through the passive listener.
    pub enable_global_match: bool,

    /// Only route passive messages that mention or wake the bot.
    pub activate_by_wake: bool,

    /// Announce the matched command before invoking it.
    pub matched_tips: bool,

    /// Fixed chat provider id; empty means "use the conversation's provider".
    pub text_provider_id: String,

    /// Provider used when a conversation has no explicit selection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<String>,

    /// LLM providers keyed by provider id.
    pub providers: BTreeMap<String, ProviderConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            enable_global_match: true,
            activate_by_wake: true,
            matched_tips: false,
            text_provider_id: String::new(),
            default_provider: None,
            providers: BTreeMap::new(),
            logging: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProviderConfig {
    Ollama {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
        model: String,
    },
    OpenRouter {
        api_key: String,
        model: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
    },
    /// Replays canned replies in order; for demos and dry runs.
    Mock {
        #[serde(default)]
        responses: Vec<String>,
    },
}

impl ProviderConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderConfig::Ollama { .. } => "ollama",
            ProviderConfig::OpenRouter { .. } => "openrouter",
            ProviderConfig::Mock { .. } => "mock",
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. "info" or "cmdrouter_commands=debug".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Directory for the rolling NDJSON log file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    /// Emit console output as JSON instead of human-readable lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_uses_router_defaults() {
        let cfg: RouterConfig = serde_yaml::from_str("{}").unwrap();
        assert!(cfg.enable_global_match);
        assert!(cfg.activate_by_wake);
        assert!(!cfg.matched_tips);
        assert!(cfg.text_provider_id.is_empty());
    }

    #[test]
    fn test_provider_entries_are_tagged_by_kind() {
        let yaml = r#"
text_provider_id: local
providers:
  local:
    kind: ollama
    model: qwen2.5:7b
  canned:
    kind: mock
    responses: ['{"matched": false, "reason": "demo"}']
"#;
        let cfg: RouterConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.providers.len(), 2);
        assert_eq!(cfg.providers["local"].kind(), "ollama");
        assert!(matches!(
            &cfg.providers["canned"],
            ProviderConfig::Mock { responses } if responses.len() == 1
        ));
    }
}
