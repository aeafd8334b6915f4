use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Reports service status and which collaborators are configured. Missing
/// LLM credentials degrade explanations, not matching, so status stays
/// informative rather than failing.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let anthropic = if state.config.anthropic_api_key.is_some() {
        "configured"
    } else {
        "missing"
    };
    let status = if state.config.anthropic_api_key.is_some() {
        "ok"
    } else {
        "degraded"
    };

    Json(json!({
        "status": status,
        "version": env!("CARGO_PKG_VERSION"),
        "service": "jobscout-api",
        "components": {
            "job_source": "configured",
            "anthropic": anthropic,
            "cache_entries": state.cache.len(),
        }
    }))
}
