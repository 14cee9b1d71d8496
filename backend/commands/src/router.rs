//! Router entry points.
//!
//! Each entry point returns a [`ReplyStream`] and never fails: errors are
//! logged with their cause chain, provider failures become a quoted reply,
//! everything else is swallowed so the listener keeps serving messages.

use std::error::Error as _;
use std::sync::Arc;

use futures::future;
use futures::stream::{self, StreamExt};
use tracing::{debug, error, info};

use cmdrouter_config::RouterConfig;
use cmdrouter_core::{CommandHost, LlmGateway, MessageEvent, ReplyStream, RouterError};

use crate::catalog::Catalog;
use crate::detection::{detect_command, SlashCommand};
use crate::dispatch::{DispatchStream, Dispatcher};
use crate::filter::entry_filter;
use crate::lifecycle::SyncController;
use crate::matcher::Matcher;

pub struct CommandRouter {
    config: RouterConfig,
    sync: Arc<SyncController>,
    matcher: Matcher,
    dispatcher: Dispatcher,
}

impl CommandRouter {
    pub fn new(
        config: RouterConfig,
        host: Arc<dyn CommandHost>,
        gateway: Arc<dyn LlmGateway>,
    ) -> Self {
        let sync = Arc::new(SyncController::new(Arc::new(Catalog::new(host))));
        let matcher = Matcher::new(gateway, config.text_provider_id.clone());
        let dispatcher = Dispatcher::new(Arc::clone(&sync), config.matched_tips);
        Self { config, sync, matcher, dispatcher }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        self.sync.catalog()
    }

    /// Build the catalog once the host has finished loading plugins.
    pub async fn on_host_ready(&self) {
        if let Err(err) = self.sync.on_host_ready().await {
            error!("[Router] Initial catalog build failed: {}", error_chain(&err));
        }
    }

    /// Passive listener for ordinary messages.
    pub async fn global_parser(&self, event: Arc<dyn MessageEvent>) -> ReplyStream {
        if !entry_filter(&self.config, event.as_ref()) {
            return stream::empty().boxed();
        }
        let text = event.message_str().to_string();
        self.route(event, &text).await
    }

    /// Explicit parse command. Routes `text` regardless of wake state.
    pub async fn command_parser(&self, event: Arc<dyn MessageEvent>, text: &str) -> ReplyStream {
        if text.trim().is_empty() {
            debug!("[Router] Parse command without a message");
            return stream::empty().boxed();
        }
        self.route(event, text.trim()).await
    }

    /// Explicit sync command. Replies with the plugin changes.
    pub async fn sync_command(&self, event: Arc<dyn MessageEvent>) -> ReplyStream {
        match self.sync.sync().await {
            Ok(diff) => {
                let reply = event.plain_result(&diff.summary());
                stream::once(future::ready(reply)).boxed()
            }
            Err(err) => self.report(event.as_ref(), err),
        }
    }

    /// Route a raw message: the router's own slash commands first, the
    /// passive listener otherwise.
    pub async fn handle_message(&self, event: Arc<dyn MessageEvent>) -> ReplyStream {
        let Some(invocation) = detect_command(event.message_str()) else {
            return self.global_parser(event).await;
        };
        info!("[Router] {} from {}", invocation.alias, event.sender_id());
        match invocation.command {
            SlashCommand::Parse => {
                let text = invocation.rest.to_string();
                self.command_parser(event, &text).await
            }
            SlashCommand::Sync => self.sync_command(event).await,
        }
    }

    async fn route(&self, event: Arc<dyn MessageEvent>, text: &str) -> ReplyStream {
        match self.try_route(Arc::clone(&event), text).await {
            Ok(replies) => guard(replies),
            Err(err) => self.report(event.as_ref(), err),
        }
    }

    async fn try_route(
        &self,
        event: Arc<dyn MessageEvent>,
        text: &str,
    ) -> Result<DispatchStream, RouterError> {
        self.sync.ensure_ready().await?;
        let snapshot = self.sync.catalog().snapshot().await;
        let result = self.matcher.submit(&snapshot, event.unified_msg_origin(), text).await?;
        self.dispatcher.dispatch(&snapshot, event, result).await
    }

    fn report(&self, event: &dyn MessageEvent, err: RouterError) -> ReplyStream {
        error!(origin = %event.unified_msg_origin(), "[Router] {}", error_chain(&err));
        if err.is_user_facing() {
            let reply = event.quote_result(&err.to_string());
            return stream::once(future::ready(reply)).boxed();
        }
        stream::empty().boxed()
    }
}

/// Log and stop at the first handler error mid-stream.
fn guard(replies: DispatchStream) -> ReplyStream {
    replies
        .scan((), |_, item| {
            future::ready(match item {
                Ok(reply) => Some(reply),
                Err(err) => {
                    error!("[Router] Handler failed mid-stream: {:#}", err);
                    None
                }
            })
        })
        .boxed()
}

fn error_chain(err: &RouterError) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
