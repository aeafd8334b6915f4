use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::matching::orchestrator;
use crate::models::matching::{MatchRequest, MatchResponse};
use crate::skills::extractor::{self, TextOrigin};
use crate::skills::gap::{self, SkillComparison};
use crate::state::AppState;

/// POST /api/v1/match
pub async fn handle_match(
    State(state): State<AppState>,
    Json(req): Json<MatchRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    let response = orchestrator::match_jobs(state, req).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct SkillAnalyzeRequest {
    pub resume_text: String,
    pub job_text: String,
}

/// POST /api/v1/skills/analyze
/// Standalone resume-vs-job-description comparison; no fetching, no
/// embeddings, no cache.
pub async fn handle_skill_analyze(
    State(_state): State<AppState>,
    Json(req): Json<SkillAnalyzeRequest>,
) -> Result<Json<SkillComparison>, AppError> {
    let resume_skills = extractor::extract(&req.resume_text, TextOrigin::Resume)
        .map_err(|e| AppError::Validation(format!("resume_text: {e}")))?;
    let job_skills = extractor::extract(&req.job_text, TextOrigin::JobRequirement)
        .map_err(|e| AppError::Validation(format!("job_text: {e}")))?;

    Ok(Json(gap::analyze(&resume_skills, &job_skills, &[])))
}
