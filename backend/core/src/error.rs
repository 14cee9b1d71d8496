use thiserror::Error;

/// Top-level error type for the command router.
#[derive(Debug, Error)]
pub enum RouterError {
    /// No usable chat provider id could be resolved for the conversation.
    #[error("{0}")]
    NoProvider(String),

    #[error("could not parse model reply: {0}")]
    ResponseParse(String),

    /// The catalog still disagrees with the host after one automatic resync.
    #[error("command catalog out of sync for {command}")]
    CatalogOutOfSync { command: String },

    #[error("no catalog entry for id {0}")]
    UnknownCommand(u32),

    #[error("host error: {0}")]
    Host(String),

    #[error("LLM provider error ({provider}): {message}")]
    Llm { provider: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RouterError {
    /// Whether the failure should be reported back to the requesting user.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, RouterError::NoProvider(_))
    }
}
