//! Error types for the text generation layer.

use marquee_core::MarqueeError;

/// Errors from the text generator.
///
/// Transport failures ([`LlmError::Http`]) and upstream rejections
/// ([`LlmError::Api`]) are kept distinct so callers can tell a dead network
/// from a dead API key.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("generation returned no content")]
    EmptyResponse,
}

impl From<LlmError> for MarqueeError {
    fn from(err: LlmError) -> Self {
        MarqueeError::Generation(err.to_string())
    }
}
