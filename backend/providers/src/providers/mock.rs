use std::collections::VecDeque;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

use cmdrouter_core::{LlmProvider, LlmRequest, LlmResponse};

/// A mock LLM provider that replays scripted replies in order.
///
/// Once the script runs out, the fixed response (if any) is returned for
/// every further call; without one the call fails.
pub struct MockProvider {
    name: String,
    script: Mutex<VecDeque<String>>,
    fixed_response: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
            fixed_response: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(response.into());
        self
    }

    pub fn with_script<I, S>(self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let script = replies.into_iter().map(Into::into).collect();
        Self { script: Mutex::new(script), ..self }
    }

    /// Prompts received so far, oldest first.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, req: &LlmRequest) -> Result<LlmResponse> {
        self.prompts.lock().await.push(req.user_prompt.clone());

        let content = match self.script.lock().await.pop_front() {
            Some(reply) => reply,
            None => match &self.fixed_response {
                Some(reply) => reply.clone(),
                None => bail!("mock provider '{}' has no scripted reply left", self.name),
            },
        };

        Ok(LlmResponse {
            content,
            provider: self.name.clone(),
            model: "mock".to_string(),
            tokens_used: 0,
            latency_ms: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> LlmRequest {
        LlmRequest {
            model: "mock".into(),
            system_prompt: String::new(),
            user_prompt: prompt.into(),
            max_tokens: 16,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn test_script_then_fixed_response() {
        let mock = MockProvider::new("m").with_script(["first"]).with_response("rest");
        assert_eq!(mock.complete(&request("a")).await.unwrap().content, "first");
        assert_eq!(mock.complete(&request("b")).await.unwrap().content, "rest");
        assert_eq!(mock.prompts().await, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_exhausted_script_fails() {
        let mock = MockProvider::new("m");
        assert!(mock.complete(&request("a")).await.is_err());
    }
}
