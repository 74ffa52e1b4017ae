//! Text generation for Marquee.
//!
//! Provides the [`TextGenerator`] trait the chat engine depends on, an
//! OpenAI-compatible HTTP client implementing it, and helpers for coaxing
//! structured JSON out of model completions.

pub mod error;
pub mod generator;
pub mod structured;

pub use error::LlmError;
pub use generator::{OpenAiGenerator, TextGenerator};
pub use structured::{parse_or_fallback, Outcome};
