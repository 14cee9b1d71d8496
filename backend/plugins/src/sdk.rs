//! Plugin SDK
//!
//! Adapters that turn plain async closures into [`CommandHandler`]s of each
//! invocation shape.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use futures::Stream;

use cmdrouter_core::{CommandHandler, HandlerOutput, MessageEvent, OutgoingMessage};

/// Handler that replies once.
pub fn single<F, Fut>(f: F) -> Arc<dyn CommandHandler>
where
    F: Fn(Arc<dyn MessageEvent>, Vec<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<OutgoingMessage>> + Send + 'static,
{
    Arc::new(move |event: Arc<dyn MessageEvent>, args: Vec<String>| -> Result<HandlerOutput> {
        Ok(HandlerOutput::single(f(event, args)))
    })
}

/// Handler that yields replies incrementally.
pub fn streaming<F, S>(f: F) -> Arc<dyn CommandHandler>
where
    F: Fn(Arc<dyn MessageEvent>, Vec<String>) -> S + Send + Sync + 'static,
    S: Stream<Item = Result<OutgoingMessage>> + Send + 'static,
{
    Arc::new(move |event: Arc<dyn MessageEvent>, args: Vec<String>| -> Result<HandlerOutput> {
        Ok(HandlerOutput::stream(f(event, args)))
    })
}

/// Handler that acts without replying.
pub fn silent<F>(f: F) -> Arc<dyn CommandHandler>
where
    F: Fn(Arc<dyn MessageEvent>, Vec<String>) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(move |event: Arc<dyn MessageEvent>, args: Vec<String>| -> Result<HandlerOutput> {
        f(event, args)?;
        Ok(HandlerOutput::Nothing)
    })
}
