use std::sync::Arc;

use crate::cache::MatchCache;
use crate::config::Config;
use crate::jobs::JobSource;
use crate::matching::explain::Explainer;
use crate::semantic::embeddings::TextEmbedder;

/// Shared application state injected into all route handlers via Axum
/// extractors. Every external collaborator sits behind a trait object so
/// tests swap in counting fakes.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub job_source: Arc<dyn JobSource>,
    pub embedder: Arc<dyn TextEmbedder>,
    pub explainer: Arc<dyn Explainer>,
    /// The only cross-request state in the engine.
    pub cache: Arc<MatchCache>,
}
