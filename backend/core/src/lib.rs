pub mod error;
pub mod event;
pub mod handler;
pub mod traits;
pub mod types;

pub use error::RouterError;
pub use event::{MessageEvent, OutgoingMessage, TextEvent};
pub use handler::{CommandHandler, HandlerOutput, ReplyStream};
pub use traits::{CommandHost, LlmCompletion, LlmGateway, LlmProvider, LlmRequest, LlmResponse};
pub use types::{CommandRecord, HandlerParam, ParamDescriptor, PluginMetadata};
