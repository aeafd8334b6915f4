//! Hybrid scoring: semantic similarity + skill overlap - missing-skill
//! penalty, on a 0-100 scale with a fixed tie-break policy.
//!
//! The scorer is pure: same inputs (with fixed embeddings) always produce
//! the same `MatchResult`.

use crate::jobs::Posting;
use crate::models::matching::MatchResult;
use crate::skills::{SkillLevel, SkillSet};

/// Semantic similarity contributes up to this many points.
pub const MAX_SEMANTIC_POINTS: f64 = 50.0;
/// Skill overlap contributes up to this many points.
pub const MAX_SKILL_POINTS: f64 = 40.0;
/// Subtracted per required skill entirely absent from the resume.
pub const MISSING_SKILL_PENALTY: f64 = 5.0;
/// Total penalty cap.
pub const MAX_PENALTY: f64 = 20.0;

/// Scores one posting against the resume. `similarity` is the cosine
/// similarity from the semantic index, in [0, 1]. The `explanation` field
/// is left empty; the orchestrator fills it later.
pub fn score(
    resume_skills: &SkillSet,
    posting: &Posting,
    posting_skills: &SkillSet,
    similarity: f64,
) -> MatchResult {
    let semantic_score = round1(similarity.clamp(0.0, 1.0) * MAX_SEMANTIC_POINTS);

    // Each required skill is worth an equal share of the skill budget.
    let share = MAX_SKILL_POINTS / posting_skills.len().max(1) as f64;

    let mut matched_skills = Vec::new();
    let mut missing_required = Vec::new();
    let mut raw_skill_score = 0.0;

    for required in posting_skills.iter() {
        match resume_skills.get(&required.name) {
            Some(own) => {
                raw_skill_score += share * level_credit(own.level, required.level);
                matched_skills.push(own.clone());
            }
            None => missing_required.push(required.name.clone()),
        }
    }

    let skill_score = round1(raw_skill_score.min(MAX_SKILL_POINTS));
    let penalty = round1((missing_required.len() as f64 * MISSING_SKILL_PENALTY).min(MAX_PENALTY));
    let match_score = round1((semantic_score + skill_score - penalty).clamp(0.0, 100.0));

    matched_skills.sort_by(|a, b| b.level.cmp(&a.level).then_with(|| a.name.cmp(&b.name)));

    MatchResult {
        posting_id: posting.id.clone(),
        title: posting.title.clone(),
        company: posting.company.clone(),
        location: posting.location.clone(),
        employment_type: posting.employment_type.clone(),
        salary_range: posting.salary_range.clone(),
        apply_link: posting.apply_link.clone(),
        match_score,
        semantic_score,
        skill_score,
        penalty,
        recommendation: recommendation_for(match_score).to_string(),
        matched_skills,
        missing_required_skills: missing_required,
        explanation: String::new(),
    }
}

/// Full credit at or above the required level, half credit exactly one tier
/// below, nothing otherwise.
fn level_credit(resume: SkillLevel, required: SkillLevel) -> f64 {
    if resume >= required {
        1.0
    } else if resume == required.one_below() {
        0.5
    } else {
        0.0
    }
}

pub fn recommendation_for(match_score: f64) -> &'static str {
    if match_score >= 80.0 {
        "Excellent Match"
    } else if match_score >= 65.0 {
        "Strong Match"
    } else if match_score >= 50.0 {
        "Good Match"
    } else {
        "Weak Match"
    }
}

/// Final ranking: score descending, ties by higher semantic score, then
/// alphabetical title.
pub fn rank(results: &mut [MatchResult]) {
    results.sort_by(|a, b| {
        b.match_score
            .partial_cmp(&a.match_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                b.semantic_score
                    .partial_cmp(&a.semantic_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.title.cmp(&b.title))
    });
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::{Skill, SkillCategory};

    fn set(skills: &[(&str, SkillLevel)]) -> SkillSet {
        skills
            .iter()
            .map(|(name, level)| Skill {
                name: name.to_string(),
                level: *level,
                years_experience: 0.0,
                category: SkillCategory::Other,
            })
            .collect()
    }

    fn posting(id: &str, title: &str) -> Posting {
        Posting {
            id: id.to_string(),
            title: title.to_string(),
            company: "Acme".to_string(),
            location: "Pune, India".to_string(),
            description: "desc".to_string(),
            apply_link: None,
            posted_at: None,
            employment_type: "Full-time".to_string(),
            salary_range: "Not specified".to_string(),
        }
    }

    #[test]
    fn test_expert_resume_vs_mixed_requirements() {
        let resume = set(&[("python", SkillLevel::Expert)]);
        let required = set(&[
            ("python", SkillLevel::Intermediate),
            ("docker", SkillLevel::Intermediate),
        ]);

        let result = score(&resume, &posting("p1", "Backend"), &required, 0.8);

        assert_eq!(result.semantic_score, 40.0);
        // python: full credit on a 20-point share; docker: missing.
        assert_eq!(result.skill_score, 20.0);
        assert_eq!(result.penalty, 5.0);
        assert!(result.penalty > 0.0);
        assert_eq!(result.match_score, 55.0);
        assert_eq!(result.matched_skills.len(), 1);
        assert_eq!(result.matched_skills[0].name, "python");
        assert_eq!(result.missing_required_skills, vec!["docker".to_string()]);
    }

    #[test]
    fn test_half_credit_one_tier_below() {
        let resume = set(&[("rust", SkillLevel::Intermediate)]);
        let required = set(&[("rust", SkillLevel::Proficient)]);

        let result = score(&resume, &posting("p1", "Systems"), &required, 0.0);
        assert_eq!(result.skill_score, 20.0); // half of the full 40-point share
        assert_eq!(result.penalty, 0.0);
    }

    #[test]
    fn test_zero_credit_two_tiers_below() {
        let resume = set(&[("rust", SkillLevel::Beginner)]);
        let required = set(&[("rust", SkillLevel::Proficient)]);

        let result = score(&resume, &posting("p1", "Systems"), &required, 0.0);
        assert_eq!(result.skill_score, 0.0);
        // present in the resume, so no missing-skill penalty
        assert_eq!(result.penalty, 0.0);
        assert!(result.missing_required_skills.is_empty());
    }

    #[test]
    fn test_penalty_caps_at_20() {
        let resume = set(&[]);
        let required = set(&[
            ("a1", SkillLevel::Intermediate),
            ("b2", SkillLevel::Intermediate),
            ("c3", SkillLevel::Intermediate),
            ("d4", SkillLevel::Intermediate),
            ("e5", SkillLevel::Intermediate),
            ("f6", SkillLevel::Intermediate),
        ]);

        let result = score(&resume, &posting("p1", "X"), &required, 1.0);
        assert_eq!(result.penalty, 20.0);
        assert_eq!(result.match_score, 30.0); // 50 + 0 - 20
    }

    #[test]
    fn test_no_required_skills_scores_on_semantics_only() {
        let resume = set(&[("python", SkillLevel::Expert)]);
        let required = set(&[]);

        let result = score(&resume, &posting("p1", "X"), &required, 0.73);
        assert_eq!(result.skill_score, 0.0);
        assert_eq!(result.penalty, 0.0);
        assert_eq!(result.semantic_score, 36.5);
        assert_eq!(result.match_score, 36.5);
    }

    #[test]
    fn test_score_clamped_to_zero() {
        let resume = set(&[]);
        let required = set(&[
            ("a", SkillLevel::Intermediate),
            ("b", SkillLevel::Intermediate),
            ("c", SkillLevel::Intermediate),
            ("d", SkillLevel::Intermediate),
        ]);

        let result = score(&resume, &posting("p1", "X"), &required, 0.0);
        assert_eq!(result.match_score, 0.0);
    }

    #[test]
    fn test_score_is_reproducible() {
        let resume = set(&[("python", SkillLevel::Proficient), ("aws", SkillLevel::Beginner)]);
        let required = set(&[("python", SkillLevel::Expert), ("docker", SkillLevel::Beginner)]);
        let p = posting("p1", "Backend");

        let first = score(&resume, &p, &required, 0.631);
        let second = score(&resume, &p, &required, 0.631);
        assert_eq!(first, second);
    }

    #[test]
    fn test_matched_and_missing_are_disjoint() {
        let resume = set(&[("python", SkillLevel::Beginner), ("git", SkillLevel::Expert)]);
        let required = set(&[
            ("python", SkillLevel::Expert),
            ("git", SkillLevel::Beginner),
            ("docker", SkillLevel::Intermediate),
        ]);

        let result = score(&resume, &posting("p1", "X"), &required, 0.5);
        for matched in &result.matched_skills {
            assert!(!result.missing_required_skills.contains(&matched.name));
        }
    }

    #[test]
    fn test_matched_skills_ordered_by_level_then_name() {
        let resume = set(&[
            ("aws", SkillLevel::Intermediate),
            ("python", SkillLevel::Expert),
            ("docker", SkillLevel::Intermediate),
        ]);
        let required = set(&[
            ("aws", SkillLevel::Beginner),
            ("docker", SkillLevel::Beginner),
            ("python", SkillLevel::Beginner),
        ]);

        let result = score(&resume, &posting("p1", "X"), &required, 0.0);
        let names: Vec<&str> = result.matched_skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["python", "aws", "docker"]);
    }

    #[test]
    fn test_recommendation_tiers() {
        assert_eq!(recommendation_for(80.0), "Excellent Match");
        assert_eq!(recommendation_for(79.9), "Strong Match");
        assert_eq!(recommendation_for(65.0), "Strong Match");
        assert_eq!(recommendation_for(64.9), "Good Match");
        assert_eq!(recommendation_for(50.0), "Good Match");
        assert_eq!(recommendation_for(49.9), "Weak Match");
    }

    #[test]
    fn test_rank_breaks_ties_by_semantic_then_title() {
        let resume = set(&[("python", SkillLevel::Expert)]);
        let no_required = set(&[]);
        let required = set(&[("python", SkillLevel::Intermediate)]);

        // p1/p2: 30 points, all semantic. p3: the same 30 points, but
        // composed as 20 skill + 10 semantic.
        let mut results = vec![
            score(&resume, &posting("p1", "Zeta Role"), &no_required, 0.6),
            score(&resume, &posting("p2", "Alpha Role"), &no_required, 0.6),
            score(&resume, &posting("p3", "Beta Role"), &required, 0.0),
        ];
        results[2].match_score = 30.0;
        assert_eq!(results[2].semantic_score, 0.0);

        rank(&mut results);
        let ids: Vec<&str> = results.iter().map(|r| r.posting_id.as_str()).collect();
        // p1/p2 tie on everything but title; p3 ties on score with lower
        // semantic, so it ranks last.
        assert_eq!(ids, vec!["p2", "p1", "p3"]);
    }
}
