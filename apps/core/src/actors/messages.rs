use tokio::sync::oneshot;

/// Defines errors that can occur within the actor system.
#[derive(Debug, thiserror::Error, Clone)]
pub enum ActorError {
    /// The actor's mailbox or reply channel was closed before an answer arrived.
    #[error("Actor channel closed: {0}")]
    ChannelClosed(String),
}

// Re-export AppError for convenience
pub use crate::error::AppError;

/// Messages that can be sent to the `LlmActor`.
#[derive(Debug)]
pub enum LlmMessage {
    /// A request for a single, non-streaming text completion.
    Complete {
        prompt: String,
        /// Upper bound on generated tokens, chosen per task.
        max_tokens: u32,
        /// A channel to send the final `String` result back.
        responder: oneshot::Sender<Result<String, AppError>>,
    },
}
