use anyhow::{Context, Result};

use crate::semantic::embeddings::DEFAULT_EMBEDDING_MODEL;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// SerpAPI key. `SERPAPI_KEY` and `SEARCHAPI_KEY` are both accepted.
    pub serpapi_key: String,
    /// Optional: without it, explanations fall back to rule-based text.
    pub anthropic_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub cache_ttl_hours: i64,
    pub embedding_model: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let serpapi_key = std::env::var("SERPAPI_KEY")
            .or_else(|_| std::env::var("SEARCHAPI_KEY"))
            .context("SERPAPI_KEY or SEARCHAPI_KEY must be set")?;

        Ok(Config {
            serpapi_key,
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            cache_ttl_hours: std::env::var("CACHE_TTL_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse::<i64>()
                .context("CACHE_TTL_HOURS must be a number of hours")?,
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string()),
        })
    }
}
