use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{MarqueeError, Result};

/// Top-level configuration for the Marquee application.
///
/// Loaded from `~/.marquee/config.toml` by default. Each section corresponds
/// to a bounded context or cross-cutting concern. API keys are never stored
/// here; sections name the environment variable that carries them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarqueeConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl Default for MarqueeConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            generation: GenerationConfig::default(),
            sources: SourcesConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

impl MarqueeConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MarqueeConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| MarqueeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Address to bind the HTTP server to.
    pub host: String,
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Allowed CORS origins for browser clients.
    pub cors_origins: Vec<String>,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: vec!["http://localhost:3000".to_string()],
            log_level: "info".to_string(),
        }
    }
}

/// Text generation (LLM) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Total request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            api_key_env: "OPENAI_API_KEY".to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 60,
        }
    }
}

/// Entity source settings: which kinds are enabled and how to reach their
/// backing services.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Enable movie lookups.
    pub enable_movies: bool,
    /// Enable person lookups.
    pub enable_people: bool,
    /// Enable encyclopedia topic lookups.
    pub enable_topics: bool,
    /// Movie database settings.
    #[serde(default)]
    pub tmdb: TmdbConfig,
    /// Encyclopedia settings.
    #[serde(default)]
    pub wikipedia: WikipediaConfig,
    /// HTTP request timeout for source lookups, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            enable_movies: true,
            enable_people: true,
            enable_topics: true,
            tmdb: TmdbConfig::default(),
            wikipedia: WikipediaConfig::default(),
            request_timeout_secs: 15,
        }
    }
}

/// TMDb API sub-configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TmdbConfig {
    /// API base URL.
    pub base_url: String,
    /// Base URL prepended to image file paths.
    pub image_base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.themoviedb.org/3".to_string(),
            image_base_url: "https://image.tmdb.org/t/p/original/".to_string(),
            api_key_env: "TMDB_API_KEY".to_string(),
        }
    }
}

/// Wikipedia API sub-configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WikipediaConfig {
    /// MediaWiki API endpoint.
    pub endpoint: String,
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://en.wikipedia.org/w/api.php".to_string(),
        }
    }
}

/// Chat engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum accepted user message length in characters.
    pub max_message_length: usize,
    /// Maximum conversations retained in memory before the least recently
    /// updated is evicted.
    pub max_conversations: usize,
    /// Number of related queries suggested after each response.
    pub related_query_count: usize,
    /// Maximum images attached per resolved entity.
    pub max_images_per_entity: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_length: 4000,
            max_conversations: 256,
            related_query_count: 3,
            max_images_per_entity: 3,
        }
    }
}
