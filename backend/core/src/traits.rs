use anyhow::Result;
use async_trait::async_trait;

use crate::types::{CommandRecord, ParamDescriptor, PluginMetadata};

/// Introspection surface of the plugin host.
#[async_trait]
pub trait CommandHost: Send + Sync {
    /// Every registered command, groups included, in host order.
    async fn list_commands(&self) -> Result<Vec<CommandRecord>>;

    /// Parameter declarations, optionally including group sub-commands.
    fn collect_parameter_descriptors(&self, include_sub_commands: bool) -> Vec<ParamDescriptor>;

    /// Live metadata for a registered plugin, `None` once it is gone.
    fn get_registered_plugin(&self, name: &str) -> Option<PluginMetadata>;
}

/// Text generation as offered by the host's configured providers.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn generate(&self, chat_provider_id: &str, prompt: &str) -> Result<LlmCompletion>;

    /// Provider currently selected for a conversation, if any.
    async fn current_provider_id(&self, unified_msg_origin: &str) -> Result<Option<String>>;
}

/// Result of [`LlmGateway::generate`].
#[derive(Debug, Clone)]
pub struct LlmCompletion {
    pub completion_text: String,
    pub provider: String,
}

/// Trait for concrete LLM backends behind a gateway.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., "openrouter", "ollama").
    fn name(&self) -> &str;

    /// Send a completion request and return the response text.
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse>;
}

/// Request to an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Response from an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}
