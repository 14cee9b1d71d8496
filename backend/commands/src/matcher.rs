//! Model-backed matching: provider resolution, prompt, reply parsing.

use std::sync::Arc;

use tracing::{debug, info};

use cmdrouter_core::{LlmGateway, RouterError};
use cmdrouter_logging::truncate_for_log;

use crate::catalog::CatalogSnapshot;
use crate::codec::{self, MatchResult};

/// Reply shown to the user when no chat provider can be resolved.
pub const NO_PROVIDER_MESSAGE: &str = "LLM供应商获取错误！";

pub struct Matcher {
    gateway: Arc<dyn LlmGateway>,
    text_provider_id: String,
}

impl Matcher {
    pub fn new(gateway: Arc<dyn LlmGateway>, text_provider_id: impl Into<String>) -> Self {
        Self { gateway, text_provider_id: text_provider_id.into() }
    }

    /// The configured provider if set, otherwise the conversation's current one.
    pub async fn resolve_provider(&self, unified_msg_origin: &str) -> Result<String, RouterError> {
        if !self.text_provider_id.is_empty() {
            return Ok(self.text_provider_id.clone());
        }
        match self.gateway.current_provider_id(unified_msg_origin).await {
            Ok(Some(id)) if !id.is_empty() => Ok(id),
            Ok(_) => {
                debug!("[Matcher] No provider selected for {}", unified_msg_origin);
                Err(RouterError::NoProvider(NO_PROVIDER_MESSAGE.to_string()))
            }
            Err(e) => {
                debug!("[Matcher] Provider lookup failed for {}: {:#}", unified_msg_origin, e);
                Err(RouterError::NoProvider(NO_PROVIDER_MESSAGE.to_string()))
            }
        }
    }

    /// Ask the model to match `text` against the snapshot's catalog.
    pub async fn submit(
        &self,
        snapshot: &CatalogSnapshot,
        unified_msg_origin: &str,
        text: &str,
    ) -> Result<MatchResult, RouterError> {
        let provider = self.resolve_provider(unified_msg_origin).await?;
        let prompt = snapshot.build_prompt(text);
        debug!(
            provider = %provider,
            commands = snapshot.len(),
            "[Matcher] Matching message: {}",
            truncate_for_log(text)
        );

        let completion = self
            .gateway
            .generate(&provider, &prompt)
            .await
            .map_err(|e| RouterError::Llm {
                provider: provider.clone(),
                message: format!("{e:#}"),
            })?;

        let result = codec::parse_response(&completion.completion_text)?;
        match &result {
            MatchResult::Matched { id, confidence, .. } => {
                info!(
                    provider = %provider,
                    id = id,
                    confidence = ?confidence,
                    "[Matcher] Model matched a command"
                );
            }
            MatchResult::NotMatched { reason } => {
                debug!(provider = %provider, "[Matcher] No command matched: {}", reason);
            }
        }
        Ok(result)
    }
}
