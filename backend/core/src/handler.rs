//! Handler invocation shapes.
//!
//! A command handler produces nothing, one deferred reply, or an incremental
//! sequence of replies. The shape is part of the return value, so the router
//! adapts it with a single match instead of inspecting it at runtime.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use futures::future::BoxFuture;
use futures::stream::{self, BoxStream, Stream, StreamExt};

use crate::event::{MessageEvent, OutgoingMessage};

/// Stream of replies handed back to the host. Errors have already been
/// logged and swallowed by the time a `ReplyStream` is produced.
pub type ReplyStream = BoxStream<'static, OutgoingMessage>;

/// What a handler returns once invoked.
pub enum HandlerOutput {
    Nothing,
    Single(BoxFuture<'static, Result<OutgoingMessage>>),
    Stream(BoxStream<'static, Result<OutgoingMessage>>),
}

impl HandlerOutput {
    pub fn single<F>(fut: F) -> Self
    where
        F: Future<Output = Result<OutgoingMessage>> + Send + 'static,
    {
        HandlerOutput::Single(Box::pin(fut))
    }

    pub fn stream<S>(replies: S) -> Self
    where
        S: Stream<Item = Result<OutgoingMessage>> + Send + 'static,
    {
        HandlerOutput::Stream(replies.boxed())
    }

    pub fn shape(&self) -> &'static str {
        match self {
            HandlerOutput::Nothing => "nothing",
            HandlerOutput::Single(_) => "single",
            HandlerOutput::Stream(_) => "stream",
        }
    }

    /// Flatten every shape into one ordered stream of replies.
    pub fn into_stream(self) -> BoxStream<'static, Result<OutgoingMessage>> {
        match self {
            HandlerOutput::Nothing => stream::empty().boxed(),
            HandlerOutput::Single(fut) => stream::once(fut).boxed(),
            HandlerOutput::Stream(replies) => replies,
        }
    }
}

impl fmt::Debug for HandlerOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandlerOutput::{}", self.shape())
    }
}

/// An invocable command registered by a plugin.
pub trait CommandHandler: Send + Sync {
    /// Invoke with the triggering event and the positional arguments the
    /// model extracted. Argument validation is the handler's job.
    fn invoke(&self, event: Arc<dyn MessageEvent>, args: Vec<String>) -> Result<HandlerOutput>;
}

impl<F> CommandHandler for F
where
    F: Fn(Arc<dyn MessageEvent>, Vec<String>) -> Result<HandlerOutput> + Send + Sync,
{
    fn invoke(&self, event: Arc<dyn MessageEvent>, args: Vec<String>) -> Result<HandlerOutput> {
        self(event, args)
    }
}
