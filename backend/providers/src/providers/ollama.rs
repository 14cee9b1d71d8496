use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use cmdrouter_core::{LlmProvider, LlmRequest, LlmResponse};

/// Ollama local LLM provider.
///
/// Requests JSON-constrained output, since every router prompt asks for a
/// single JSON object.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    json_mode: bool,
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            json_mode: true,
        }
    }

    pub fn with_json_mode(mut self, enabled: bool) -> Self {
        self.json_mode = enabled;
        self
    }
}

#[derive(Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: Vec<Turn<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: Options,
}

#[derive(Serialize)]
struct Turn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct Options {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct ChatReply {
    message: ReplyMessage,
    eval_count: Option<u64>,
    prompt_eval_count: Option<u64>,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: String,
}

/// Ollama model tags never carry a provider prefix such as `openai/`.
fn local_model_name(model: &str) -> &str {
    model.rsplit('/').next().unwrap_or(model)
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let start = Instant::now();
        let model = local_model_name(&request.model);

        let mut messages = Vec::with_capacity(2);
        if !request.system_prompt.is_empty() {
            messages.push(Turn { role: "system", content: &request.system_prompt });
        }
        messages.push(Turn { role: "user", content: &request.user_prompt });

        let body = ChatBody {
            model,
            messages,
            stream: false,
            format: self.json_mode.then_some("json"),
            options: Options { temperature: request.temperature, num_predict: request.max_tokens },
        };

        debug!(model = %model, json = self.json_mode, "Sending request to Ollama");

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .context("Ollama HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {}: {}", status, error_body);
        }

        let reply: ChatReply = response.json().await.context("Failed to parse Ollama response")?;

        Ok(LlmResponse {
            content: reply.message.content,
            provider: "ollama".to_string(),
            model: model.to_string(),
            tokens_used: reply.eval_count.unwrap_or(0) + reply.prompt_eval_count.unwrap_or(0),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
