//! Marquee application binary - composition root.
//!
//! Ties the Marquee crates together into a single executable:
//! 1. Load configuration from TOML
//! 2. Initialize tracing
//! 3. Build the text generator and entity source clients
//! 4. Assemble the chat engine
//! 5. Start the axum REST API server

use std::path::PathBuf;
use std::sync::Arc;

use marquee_api::AppState;
use marquee_chat::ChatEngine;
use marquee_core::MarqueeConfig;
use marquee_llm::{OpenAiGenerator, TextGenerator};
use marquee_sources::{EntitySource, TmdbClient, TmdbMovies, TmdbPeople, WikipediaClient};

fn config_path() -> PathBuf {
    if let Ok(p) = std::env::var("MARQUEE_CONFIG") {
        return PathBuf::from(p);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".marquee").join("config.toml");
    }
    PathBuf::from("config.toml")
}

/// Read a required API key from the environment variable named in config.
fn require_env(var: &str) -> Result<String, Box<dyn std::error::Error>> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => {
            tracing::error!(var, "Required API key environment variable is not set");
            Err(format!("environment variable {} is not set", var).into())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Config before tracing so the filter can fall back to its level.
    let config_file = config_path();
    let config = MarqueeConfig::load_or_default(&config_file);

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Marquee v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Text generator.
    let generation_key = require_env(&config.generation.api_key_env)?;
    let generator: Arc<dyn TextGenerator> =
        Arc::new(OpenAiGenerator::new(&config.generation, generation_key)?);
    tracing::info!(model = %config.generation.model, "Text generator ready");

    // Entity sources. The two TMDb-backed kinds share one client.
    let tmdb_key = require_env(&config.sources.tmdb.api_key_env)?;
    let tmdb = Arc::new(TmdbClient::new(
        &config.sources.tmdb,
        tmdb_key,
        config.sources.request_timeout_secs,
    )?);
    let movies: Arc<dyn EntitySource> = Arc::new(TmdbMovies::new(Arc::clone(&tmdb)));
    let people: Arc<dyn EntitySource> = Arc::new(TmdbPeople::new(tmdb));
    let topics: Arc<dyn EntitySource> = Arc::new(WikipediaClient::new(
        &config.sources.wikipedia,
        config.sources.request_timeout_secs,
    )?);
    tracing::info!("Entity sources ready");

    // Engine and API state.
    let engine = ChatEngine::new(&config, generator, movies, people, topics);
    let state = AppState::new(config.clone(), engine);

    marquee_api::start_server(&config, state).await?;

    Ok(())
}
