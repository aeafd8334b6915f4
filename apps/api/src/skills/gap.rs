//! Gap analysis: classifies a posting's requirements against a resume's
//! skill set into matched / gap (critical|moderate) / bonus.

use serde::{Deserialize, Serialize};

use super::{SkillLevel, SkillSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapSeverity {
    Critical,
    Moderate,
}

/// A required skill the resume does not cover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillGap {
    pub skill: String,
    pub resume_level: SkillLevel,
    pub required_level: SkillLevel,
    pub gap_severity: GapSeverity,
}

/// A requirement the resume covers, carrying the resume's side of the story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedSkill {
    pub skill: String,
    pub resume_level: SkillLevel,
    pub required_level: SkillLevel,
    pub years_experience: f32,
}

/// A resume skill the posting never asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusSkill {
    pub skill: String,
    pub level: SkillLevel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillComparison {
    pub matched_skills: Vec<MatchedSkill>,
    pub skill_gaps: Vec<SkillGap>,
    pub bonus_skills: Vec<BonusSkill>,
    /// Aggregate match score across the results this comparison was built
    /// for, 0-100.
    pub overall_match: f64,
}

/// Compares a resume against one posting's requirements.
///
/// `match_scores` are the final scores of the results being summarized;
/// their mean becomes `overall_match`. When none are supplied (the
/// standalone analyze endpoint), the qualified-requirement ratio is used
/// instead.
pub fn analyze(resume: &SkillSet, posting: &SkillSet, match_scores: &[f64]) -> SkillComparison {
    let mut matched = Vec::new();
    let mut gaps = Vec::new();
    let mut bonus = Vec::new();

    for required in posting.iter() {
        match resume.get(&required.name) {
            Some(own) => matched.push(MatchedSkill {
                skill: required.name.clone(),
                resume_level: own.level,
                required_level: required.level,
                years_experience: own.years_experience,
            }),
            None => gaps.push(SkillGap {
                skill: required.name.clone(),
                resume_level: SkillLevel::None,
                required_level: required.level,
                gap_severity: if required.level >= SkillLevel::Proficient {
                    GapSeverity::Critical
                } else {
                    GapSeverity::Moderate
                },
            }),
        }
    }

    for own in resume.iter() {
        if !posting.contains(&own.name) {
            bonus.push(BonusSkill {
                skill: own.name.clone(),
                level: own.level,
            });
        }
    }

    let overall_match = if !match_scores.is_empty() {
        round1(match_scores.iter().sum::<f64>() / match_scores.len() as f64)
    } else if matched.is_empty() && gaps.is_empty() {
        0.0
    } else {
        round1(matched.len() as f64 / (matched.len() + gaps.len()) as f64 * 100.0)
    };

    SkillComparison {
        matched_skills: matched,
        skill_gaps: gaps,
        bonus_skills: bonus,
        overall_match,
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
