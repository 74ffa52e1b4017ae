pub mod config;
pub mod error;
pub mod types;

pub use config::MarqueeConfig;
pub use error::{MarqueeError, Result};
pub use types::*;
