mod cache;
mod config;
mod errors;
mod jobs;
mod llm_client;
mod matching;
mod models;
mod routes;
mod semantic;
mod skills;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::{MatchCache, SystemClock};
use crate::config::Config;
use crate::jobs::serpapi::SerpApiSource;
use crate::llm_client::LlmClient;
use crate::matching::explain::{DisabledExplainer, Explainer, LlmExplainer};
use crate::routes::build_router;
use crate::semantic::embeddings::{FastembedEncoder, TextEmbedder};
use crate::skills::taxonomy::TAXONOMY_VERSION;
use crate::state::AppState;

/// How often the cache sweeper prunes expired entries. Lazy expiry on read
/// already guarantees correctness; this just bounds memory.
const SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(3600);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Jobscout API v{} (skill taxonomy {})",
        env!("CARGO_PKG_VERSION"),
        TAXONOMY_VERSION
    );

    // Job source collaborator
    let job_source = Arc::new(SerpApiSource::new(config.serpapi_key.clone()));
    info!("Job source initialized (SerpAPI Google Jobs)");

    // Embedding model (downloads weights on first run)
    let embedder = Arc::new(FastembedEncoder::new(&config.embedding_model)?);
    info!(
        "Embedding model ready: {} ({} dims)",
        embedder.model_name(),
        embedder.dimensions()
    );

    // Explanation collaborator — optional; matching works without it
    let explainer: Arc<dyn Explainer> = match &config.anthropic_api_key {
        Some(key) => {
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Arc::new(LlmExplainer::new(LlmClient::new(key.clone())))
        }
        None => {
            warn!("ANTHROPIC_API_KEY not set - explanations fall back to rule-based text");
            Arc::new(DisabledExplainer)
        }
    };

    // Process-wide match cache with single-flight collapsing
    let cache = Arc::new(MatchCache::new(
        chrono::Duration::hours(config.cache_ttl_hours),
        Arc::new(SystemClock),
    ));
    cache.spawn_sweeper(SWEEP_INTERVAL);
    info!("Match cache initialized (TTL {}h)", config.cache_ttl_hours);

    let state = AppState {
        config: config.clone(),
        job_source,
        embedder,
        explainer,
        cache,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
