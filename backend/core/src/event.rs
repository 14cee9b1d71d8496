use serde::{Deserialize, Serialize};

/// A message to send back through the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutgoingMessage {
    /// Plain text in the same conversation.
    Plain { text: String },
    /// Text sent as a quoted reply to the triggering message.
    QuoteReply { message_id: String, text: String },
}

impl OutgoingMessage {
    pub fn plain(text: impl Into<String>) -> Self {
        OutgoingMessage::Plain { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            OutgoingMessage::Plain { text } => text,
            OutgoingMessage::QuoteReply { text, .. } => text,
        }
    }
}

/// The host's inbound message event, as seen by the router.
pub trait MessageEvent: Send + Sync {
    /// Raw message text.
    fn message_str(&self) -> &str;

    fn message_id(&self) -> &str;

    /// Conversation origin, used for per-conversation provider lookup.
    fn unified_msg_origin(&self) -> &str;

    fn sender_id(&self) -> &str;

    /// True if another responder already produced a reply for this event.
    fn has_replied(&self) -> bool;

    /// True if the bot was mentioned or woken explicitly.
    fn is_at_or_wake_command(&self) -> bool;

    fn is_admin(&self) -> bool;

    fn plain_result(&self, text: &str) -> OutgoingMessage {
        OutgoingMessage::plain(text)
    }

    fn quote_result(&self, text: &str) -> OutgoingMessage {
        OutgoingMessage::QuoteReply {
            message_id: self.message_id().to_string(),
            text: text.to_string(),
        }
    }
}

/// Plain-data event for hosts that deliver text lines (REPLs, tests).
#[derive(Debug, Clone, Default)]
pub struct TextEvent {
    pub text: String,
    pub message_id: String,
    pub origin: String,
    pub sender_id: String,
    pub replied: bool,
    pub woken: bool,
    pub admin: bool,
}

impl TextEvent {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            message_id: "0".to_string(),
            origin: "local:private:0".to_string(),
            sender_id: "0".to_string(),
            replied: false,
            woken: true,
            admin: false,
        }
    }

    pub fn with_message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = id.into();
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender_id = sender.into();
        self
    }

    pub fn admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }

    pub fn woken(mut self, woken: bool) -> Self {
        self.woken = woken;
        self
    }

    pub fn replied(mut self, replied: bool) -> Self {
        self.replied = replied;
        self
    }
}

impl MessageEvent for TextEvent {
    fn message_str(&self) -> &str {
        &self.text
    }

    fn message_id(&self) -> &str {
        &self.message_id
    }

    fn unified_msg_origin(&self) -> &str {
        &self.origin
    }

    fn sender_id(&self) -> &str {
        &self.sender_id
    }

    fn has_replied(&self) -> bool {
        self.replied
    }

    fn is_at_or_wake_command(&self) -> bool {
        self.woken
    }

    fn is_admin(&self) -> bool {
        self.admin
    }
}
