pub mod health;
pub mod matching;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Matching engine
        .route("/api/v1/match", post(matching::handle_match))
        .route(
            "/api/v1/skills/analyze",
            post(matching::handle_skill_analyze),
        )
        .with_state(state)
}
