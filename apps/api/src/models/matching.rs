//! Request/response data models for the matching API.

use serde::{Deserialize, Serialize};

use crate::skills::gap::SkillComparison;
use crate::skills::Skill;

/// Experience seniority bands accepted as a request filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
}

fn default_location() -> String {
    "India".to_string()
}
fn default_num_jobs() -> usize {
    30
}
fn default_top_k() -> usize {
    10
}
fn default_use_cache() -> bool {
    true
}
fn default_min_match_score() -> f64 {
    40.0
}

/// POST /api/v1/match request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRequest {
    pub resume_text: String,
    pub job_query: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_num_jobs")]
    pub num_jobs: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
    #[serde(default = "default_min_match_score")]
    pub min_match_score: f64,
    #[serde(default)]
    pub experience_level: Option<ExperienceLevel>,
    #[serde(default)]
    pub posted_within_days: Option<i64>,
    #[serde(default)]
    pub exclude_remote: bool,
}

/// One scored posting. `explanation` is best-effort text from the external
/// collaborator and may be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub posting_id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub employment_type: String,
    pub salary_range: String,
    pub apply_link: Option<String>,
    /// 0-100, one decimal: clamp(semantic + skill - penalty).
    pub match_score: f64,
    /// 0-50 semantic similarity contribution.
    pub semantic_score: f64,
    /// 0-40 skill overlap contribution.
    pub skill_score: f64,
    /// 0-20, subtracted for absent required skills.
    pub penalty: f64,
    pub recommendation: String,
    /// Ordered by descending resume level, then name.
    pub matched_skills: Vec<Skill>,
    pub missing_required_skills: Vec<String>,
    #[serde(default)]
    pub explanation: String,
}

/// Career guidance from the explanation collaborator. Every field defaults
/// so a partial or malformed reply degrades instead of failing the parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CareerAdvice {
    #[serde(default)]
    pub current_assessment: String,
    #[serde(default)]
    pub skill_gaps: Vec<AdviceSkillGap>,
    #[serde(default)]
    pub learning_path: Vec<LearningResource>,
    #[serde(default)]
    pub career_progression: Vec<CareerStage>,
    #[serde(default)]
    pub market_insights: String,
    #[serde(default)]
    pub action_plan: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdviceSkillGap {
    #[serde(default)]
    pub skill: String,
    #[serde(default)]
    pub importance: String,
    #[serde(default)]
    pub current_level: String,
    #[serde(default)]
    pub target_level: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningResource {
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub difficulty: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CareerStage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub timeline: String,
    #[serde(default)]
    pub key_skills_needed: Vec<String>,
    #[serde(default)]
    pub typical_responsibilities: Vec<String>,
}

/// The cacheable payload of one computed match query. `warnings` describe
/// how the stored data was degraded (if at all) when it was computed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CachedMatch {
    pub results: Vec<MatchResult>,
    pub skill_comparison: Option<SkillComparison>,
    pub career_advice: Option<CareerAdvice>,
    pub total_jobs_fetched: usize,
    pub total_jobs_indexed: usize,
    pub warnings: Vec<String>,
}

/// POST /api/v1/match response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponse {
    pub matched_jobs: Vec<MatchResult>,
    pub skill_comparison: Option<SkillComparison>,
    pub career_advice: Option<CareerAdvice>,
    pub total_jobs_fetched: usize,
    pub total_jobs_indexed: usize,
    pub search_query: String,
    pub location: String,
    pub cache_used: bool,
    pub warnings: Vec<String>,
}

impl MatchResponse {
    pub fn from_cached(
        cached: CachedMatch,
        search_query: String,
        location: String,
        cache_used: bool,
    ) -> Self {
        Self {
            matched_jobs: cached.results,
            skill_comparison: cached.skill_comparison,
            career_advice: cached.career_advice,
            total_jobs_fetched: cached.total_jobs_fetched,
            total_jobs_indexed: cached.total_jobs_indexed,
            search_query,
            location,
            cache_used,
            warnings: cached.warnings,
        }
    }
}
