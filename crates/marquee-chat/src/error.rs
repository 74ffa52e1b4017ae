//! Error types for the chat engine.

use marquee_core::MarqueeError;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("generation error: {0}")]
    Generation(String),
    #[error("source error: {0}")]
    Source(String),
    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<MarqueeError> for ChatError {
    fn from(err: MarqueeError) -> Self {
        match err {
            MarqueeError::Generation(msg) => ChatError::Generation(msg),
            MarqueeError::Source(msg) => ChatError::Source(msg),
            other => ChatError::StorageError(other.to_string()),
        }
    }
}
