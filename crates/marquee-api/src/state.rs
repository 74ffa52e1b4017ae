//! Application state shared across all route handlers.
//!
//! AppState holds the chat engine and configuration. It is passed to
//! handlers via axum's State extractor.

use std::sync::Arc;
use std::time::Instant;

use marquee_chat::ChatEngine;
use marquee_core::MarqueeConfig;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks; the
/// engine synchronizes its own interior state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<MarqueeConfig>,
    /// The chat turn engine.
    pub engine: Arc<ChatEngine>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState wrapping the given engine.
    pub fn new(config: MarqueeConfig, engine: ChatEngine) -> Self {
        Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
            start_time: Instant::now(),
        }
    }
}
