//! Error types for the source layer.
//!
//! Only transport and decode failures become errors here. Upstream rejection
//! statuses are handled inside each client: they log a warning and surface as
//! "not found", matching the contract that a missing entity is not a failure.

use marquee_core::MarqueeError;

/// Errors from the external source clients.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<SourceError> for MarqueeError {
    fn from(err: SourceError) -> Self {
        MarqueeError::Source(err.to_string())
    }
}
