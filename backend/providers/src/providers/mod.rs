pub mod mock;
pub mod ollama;
pub mod openrouter;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use cmdrouter_config::{defaults, ProviderConfig, RouterConfig};
use cmdrouter_core::{LlmCompletion, LlmGateway, LlmProvider, LlmRequest};

use self::mock::MockProvider;
use self::ollama::OllamaProvider;
use self::openrouter::OpenRouterProvider;

/// Routing replies are a short JSON object.
const MAX_COMPLETION_TOKENS: u32 = 512;

struct Registered {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

/// Registry of LLM providers, looked up by provider id.
///
/// Implements [`LlmGateway`]: a conversation uses its own selection if one
/// was made, otherwise the default provider.
pub struct ProviderRegistry {
    providers: HashMap<String, Registered>,
    default_provider: Option<String>,
    selections: RwLock<HashMap<String, String>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: None,
            selections: RwLock::new(HashMap::new()),
        }
    }

    /// Build providers from config entries.
    pub fn from_config(config: &RouterConfig) -> Self {
        let mut registry = Self::new();
        for (id, entry) in &config.providers {
            let (provider, model): (Arc<dyn LlmProvider>, String) = match entry {
                ProviderConfig::Ollama { base_url, model } => {
                    let url = base_url.as_deref().unwrap_or(defaults::DEFAULT_OLLAMA_URL);
                    (Arc::new(OllamaProvider::new(url)), model.clone())
                }
                ProviderConfig::OpenRouter { api_key, model, base_url } => {
                    let url = base_url.as_deref().unwrap_or(defaults::DEFAULT_OPENROUTER_URL);
                    (Arc::new(OpenRouterProvider::new(api_key, url)), model.clone())
                }
                ProviderConfig::Mock { responses } => (
                    Arc::new(MockProvider::new(id.as_str()).with_script(responses.iter().cloned())),
                    "mock".to_string(),
                ),
            };
            info!(provider = %id, kind = entry.kind(), "Registered LLM provider");
            registry.register(id.as_str(), provider, model);
        }
        registry.default_provider = config.default_provider.clone();
        registry
    }

    pub fn register(
        &mut self,
        id: impl Into<String>,
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
    ) {
        self.providers.insert(id.into(), Registered { provider, model: model.into() });
    }

    pub fn with_default(mut self, id: impl Into<String>) -> Self {
        self.default_provider = Some(id.into());
        self
    }

    /// Pin a conversation to a provider.
    pub async fn select_for(&self, unified_msg_origin: &str, id: &str) -> Result<()> {
        if !self.providers.contains_key(id) {
            return Err(anyhow!("unknown provider '{id}'"));
        }
        self.selections
            .write()
            .await
            .insert(unified_msg_origin.to_string(), id.to_string());
        Ok(())
    }

    /// All registered provider ids, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.providers.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmGateway for ProviderRegistry {
    async fn generate(&self, chat_provider_id: &str, prompt: &str) -> Result<LlmCompletion> {
        let entry = self
            .providers
            .get(chat_provider_id)
            .ok_or_else(|| anyhow!("unknown provider '{chat_provider_id}'"))?;

        let request = LlmRequest {
            model: entry.model.clone(),
            system_prompt: String::new(),
            user_prompt: prompt.to_string(),
            max_tokens: MAX_COMPLETION_TOKENS,
            temperature: 0.0,
        };

        let response = entry.provider.complete(&request).await?;
        debug!(
            provider = %chat_provider_id,
            tokens = response.tokens_used,
            latency_ms = response.latency_ms,
            "Provider responded"
        );
        Ok(LlmCompletion {
            completion_text: response.content,
            provider: chat_provider_id.to_string(),
        })
    }

    async fn current_provider_id(&self, unified_msg_origin: &str) -> Result<Option<String>> {
        if let Some(id) = self.selections.read().await.get(unified_msg_origin) {
            return Ok(Some(id.clone()));
        }
        Ok(self.default_provider.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry.register("a", Arc::new(MockProvider::new("a").with_response("from a")), "mock");
        registry.register("b", Arc::new(MockProvider::new("b").with_response("from b")), "mock");
        registry.with_default("a")
    }

    #[tokio::test]
    async fn test_generate_uses_requested_provider() {
        let reg = registry();
        let out = reg.generate("b", "prompt").await.unwrap();
        assert_eq!(out.completion_text, "from b");
        assert_eq!(out.provider, "b");
        assert!(reg.generate("missing", "prompt").await.is_err());
    }

    #[tokio::test]
    async fn test_conversation_selection_overrides_default() {
        let reg = registry();
        assert_eq!(reg.current_provider_id("qq:group:1").await.unwrap().as_deref(), Some("a"));
        reg.select_for("qq:group:1", "b").await.unwrap();
        assert_eq!(reg.current_provider_id("qq:group:1").await.unwrap().as_deref(), Some("b"));
        assert!(reg.select_for("qq:group:1", "nope").await.is_err());
    }

    #[test]
    fn test_from_config_registers_every_entry() {
        let mut cfg = RouterConfig::default();
        let local = ProviderConfig::Ollama { base_url: None, model: "qwen2.5".into() };
        cfg.providers.insert("local".into(), local);
        let canned = ProviderConfig::Mock { responses: vec!["{}".into()] };
        cfg.providers.insert("canned".into(), canned);
        cfg.default_provider = Some("canned".into());
        let reg = ProviderRegistry::from_config(&cfg);
        assert_eq!(reg.list(), vec!["canned".to_string(), "local".to_string()]);
        assert_eq!(reg.default_provider.as_deref(), Some("canned"));
    }
}
