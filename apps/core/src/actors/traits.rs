use crate::actors::messages::AppError;
use async_trait::async_trait;

/// Defines the public interface for an LLM (Large Language Model) actor.
///
/// This trait abstracts the specific implementation of the LLM, allowing for different
/// backends (hosted API, local server, test doubles) to be used interchangeably.
#[async_trait]
pub trait LlmActor: Send + Sync + 'static {
    /// Sends `prompt` as a single user turn and returns the raw text completion.
    async fn complete(&self, prompt: String, max_tokens: u32) -> Result<String, AppError>;
}
