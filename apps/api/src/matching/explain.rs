//! The explanation/career-advice collaborator boundary.
//!
//! One structured context goes out per computed query; per-posting prose
//! explanations and career advice come back together. The engine must keep
//! working when this collaborator is absent, slow, or returns garbage —
//! every failure degrades to the deterministic fallback text.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::llm_client::prompts::{EXPLAIN_PROMPT_TEMPLATE, EXPLAIN_SYSTEM};
use crate::llm_client::{LlmClient, LlmError};
use crate::models::matching::{CareerAdvice, MatchResult};
use crate::skills::gap::SkillComparison;
use crate::skills::{Skill, SkillSet};

#[derive(Debug, Error)]
pub enum ExplainError {
    #[error("explanation generator is not configured")]
    NotConfigured,

    #[error("explanation generation failed: {0}")]
    Llm(#[from] LlmError),
}

/// The structured context handed to the collaborator.
#[derive(Debug, Serialize)]
pub struct ExplainContext {
    pub resume_skills: Vec<Skill>,
    pub results: Vec<PostingContext>,
    pub skill_comparison: Option<SkillComparison>,
}

/// Per-posting slice of the match data the collaborator reasons over.
#[derive(Debug, Serialize)]
pub struct PostingContext {
    pub posting_id: String,
    pub title: String,
    pub company: String,
    pub match_score: f64,
    pub matched_skills: Vec<String>,
    pub missing_required_skills: Vec<String>,
}

impl ExplainContext {
    pub fn new(
        resume_skills: &SkillSet,
        results: &[MatchResult],
        skill_comparison: Option<&SkillComparison>,
    ) -> Self {
        Self {
            resume_skills: resume_skills.iter().cloned().collect(),
            results: results
                .iter()
                .map(|r| PostingContext {
                    posting_id: r.posting_id.clone(),
                    title: r.title.clone(),
                    company: r.company.clone(),
                    match_score: r.match_score,
                    matched_skills: r.matched_skills.iter().map(|s| s.name.clone()).collect(),
                    missing_required_skills: r.missing_required_skills.clone(),
                })
                .collect(),
            skill_comparison: skill_comparison.cloned(),
        }
    }
}

/// What the collaborator produced. Postings absent from `explanations` get
/// the fallback text.
#[derive(Debug, Default)]
pub struct Explanation {
    pub explanations: HashMap<String, String>,
    pub career_advice: Option<CareerAdvice>,
}

/// Wire shape of the collaborator's reply. Everything defaults so missing
/// or malformed fields degrade instead of failing the whole call.
#[derive(Debug, Default, Deserialize)]
struct RawExplanation {
    #[serde(default)]
    explanations: HashMap<String, String>,
    #[serde(default)]
    career_advice: Option<CareerAdvice>,
}

#[async_trait]
pub trait Explainer: Send + Sync {
    async fn explain(&self, context: &ExplainContext) -> Result<Explanation, ExplainError>;
}

/// Production explainer backed by the Claude API.
pub struct LlmExplainer {
    llm: LlmClient,
}

impl LlmExplainer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Explainer for LlmExplainer {
    async fn explain(&self, context: &ExplainContext) -> Result<Explanation, ExplainError> {
        let context_json = serde_json::to_string_pretty(context)
            .map_err(|e| ExplainError::Llm(LlmError::Parse(e)))?;
        let prompt = EXPLAIN_PROMPT_TEMPLATE.replace("{context}", &context_json);

        let raw: RawExplanation = self.llm.call_json(&prompt, EXPLAIN_SYSTEM).await?;
        debug!(
            explanations = raw.explanations.len(),
            has_advice = raw.career_advice.is_some(),
            "explanation call returned"
        );

        Ok(Explanation {
            explanations: raw.explanations,
            career_advice: raw.career_advice,
        })
    }
}

/// Stand-in used when no API key is configured; the orchestrator falls back
/// to rule-based explanations.
pub struct DisabledExplainer;

#[async_trait]
impl Explainer for DisabledExplainer {
    async fn explain(&self, _context: &ExplainContext) -> Result<Explanation, ExplainError> {
        Err(ExplainError::NotConfigured)
    }
}

/// Deterministic rule-based explanation used when the collaborator is
/// unavailable or skipped a posting.
pub fn fallback_explanation(result: &MatchResult) -> String {
    let tone = if result.match_score >= 70.0 {
        "Strong match"
    } else if result.match_score >= 50.0 {
        "Moderate match"
    } else {
        "Weak match"
    };

    let mut explanation = format!("{tone} based on skill analysis. ");

    if !result.matched_skills.is_empty() {
        let names: Vec<&str> = result
            .matched_skills
            .iter()
            .take(3)
            .map(|s| s.name.as_str())
            .collect();
        explanation.push_str(&format!(
            "You have {} required skill(s): {}. ",
            result.matched_skills.len(),
            names.join(", ")
        ));
    }

    if !result.missing_required_skills.is_empty() {
        let names: Vec<&str> = result
            .missing_required_skills
            .iter()
            .take(3)
            .map(|s| s.as_str())
            .collect();
        explanation.push_str(&format!(
            "Missing {} required skill(s): {}. ",
            result.missing_required_skills.len(),
            names.join(", ")
        ));
    }

    if result.match_score >= 60.0 {
        explanation.push_str("Consider applying and highlighting your matching skills.");
    } else if !result.missing_required_skills.is_empty() {
        explanation.push_str("Consider upskilling in missing areas before applying.");
    }

    explanation.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::{SkillCategory, SkillLevel};

    fn result_with(score: f64, matched: &[&str], missing: &[&str]) -> MatchResult {
        MatchResult {
            posting_id: "p1".to_string(),
            title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            location: "Pune".to_string(),
            employment_type: "Full-time".to_string(),
            salary_range: "Not specified".to_string(),
            apply_link: None,
            match_score: score,
            semantic_score: 30.0,
            skill_score: 20.0,
            penalty: 0.0,
            recommendation: "Good Match".to_string(),
            matched_skills: matched
                .iter()
                .map(|name| Skill {
                    name: name.to_string(),
                    level: SkillLevel::Proficient,
                    years_experience: 2.0,
                    category: SkillCategory::Other,
                })
                .collect(),
            missing_required_skills: missing.iter().map(|s| s.to_string()).collect(),
            explanation: String::new(),
        }
    }

    #[test]
    fn test_fallback_mentions_matched_and_missing() {
        let text = fallback_explanation(&result_with(72.0, &["python", "aws"], &["docker"]));
        assert!(text.starts_with("Strong match"));
        assert!(text.contains("python, aws"));
        assert!(text.contains("docker"));
        assert!(text.contains("Consider applying"));
    }

    #[test]
    fn test_fallback_low_score_suggests_upskilling() {
        let text = fallback_explanation(&result_with(35.0, &[], &["rust", "kafka"]));
        assert!(text.starts_with("Weak match"));
        assert!(text.contains("upskilling"));
    }

    #[test]
    fn test_fallback_caps_listed_skills_at_three() {
        let text = fallback_explanation(&result_with(
            55.0,
            &["a", "b", "c", "d"],
            &[],
        ));
        assert!(text.contains("a, b, c"));
        assert!(!text.contains("d."));
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let result = result_with(60.0, &["python"], &["go"]);
        assert_eq!(fallback_explanation(&result), fallback_explanation(&result));
    }

    #[test]
    fn test_raw_explanation_parses_malformed_reply() {
        let raw: RawExplanation = serde_json::from_str(r#"{"unexpected": true}"#).unwrap();
        assert!(raw.explanations.is_empty());
        assert!(raw.career_advice.is_none());
    }

    #[test]
    fn test_raw_explanation_parses_full_reply() {
        let raw: RawExplanation = serde_json::from_str(
            r#"{
                "explanations": {"p1": "Good fit because of Python."},
                "career_advice": {"current_assessment": "Solid.", "action_plan": ["Ship a project"]}
            }"#,
        )
        .unwrap();
        assert_eq!(raw.explanations["p1"], "Good fit because of Python.");
        assert_eq!(
            raw.career_advice.unwrap().action_plan,
            vec!["Ship a project".to_string()]
        );
    }

    #[tokio::test]
    async fn test_disabled_explainer_errors() {
        let ctx = ExplainContext::new(&SkillSet::new(), &[], None);
        assert!(matches!(
            DisabledExplainer.explain(&ctx).await,
            Err(ExplainError::NotConfigured)
        ));
    }
}
