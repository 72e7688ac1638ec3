//! Actor layer: the language-model backend behind a message-passing handle.

pub mod llm;
pub mod messages;
pub mod traits;
