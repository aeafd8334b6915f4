//! Skill extraction from free text (resume or job description).
//!
//! Tokens are matched against the closed taxonomy; a bounded window of
//! surrounding text is scanned for proficiency cues and year counts.
//! Malformed text never errors — only a null/empty input does.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use super::taxonomy::TAXONOMY;
use super::{Skill, SkillLevel, SkillSet};

/// How many characters of context to inspect on each side of a mention.
const CONTEXT_WINDOW: usize = 50;

/// Where the text came from. Requirements are read literally (an unqualified
/// mention means the employer expects working knowledge); resumes are read
/// conservatively unless the skill keeps coming up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOrigin {
    Resume,
    JobRequirement,
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("cannot extract skills from empty text")]
    EmptyInput,
}

/// Proficiency cues, strongest first. The first group with a hit in the
/// context window wins.
static LEVEL_CUES: &[(SkillLevel, &[&str])] = &[
    (
        SkillLevel::Expert,
        &["expert", "advanced", "senior", "lead", "architect", "mastery"],
    ),
    (
        SkillLevel::Proficient,
        &["proficient", "strong", "skilled", "experienced"],
    ),
    (
        SkillLevel::Intermediate,
        &["intermediate", "working knowledge", "familiar with"],
    ),
    (
        SkillLevel::Beginner,
        &["basic", "beginner", "learning", "exposure to"],
    ),
];

/// Matches "5 years", "5+ years", "3-5 years", "2 yrs". The first capture is
/// the lower bound of a range.
static YEARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*\+?\s*(?:-\s*\d+\s*)?\s*(?:years?|yrs?)").unwrap());

/// Extracts a normalized skill set from `text`.
///
/// Every mention of a taxonomy skill contributes; conflicting proficiency
/// cues keep the highest level observed, and the merge in [`SkillSet`]
/// guarantees one entry per canonical name.
pub fn extract(text: &str, origin: TextOrigin) -> Result<SkillSet, ExtractionError> {
    if text.trim().is_empty() {
        return Err(ExtractionError::EmptyInput);
    }

    let lower = text.to_lowercase();
    let mut set = SkillSet::new();

    for def in TAXONOMY.iter() {
        let mut mention_count = 0usize;
        let mut cue_level: Option<SkillLevel> = None;
        let mut years = 0.0f32;

        for (start, end) in def.mentions(&lower) {
            mention_count += 1;
            let window = context_window(&lower, start, end);
            if let Some(level) = detect_level(window) {
                cue_level = Some(cue_level.map_or(level, |l| l.max(level)));
            }
            if let Some(y) = parse_years(window) {
                years = years.max(y);
            }
        }

        if mention_count == 0 {
            continue;
        }

        let level = cue_level.unwrap_or(match origin {
            TextOrigin::JobRequirement => SkillLevel::Intermediate,
            // A skill the candidate keeps mentioning is more than a passing
            // familiarity even without an explicit qualifier.
            TextOrigin::Resume if mention_count > 1 => SkillLevel::Intermediate,
            TextOrigin::Resume => SkillLevel::Beginner,
        });

        set.insert(Skill {
            name: def.canonical.to_string(),
            level,
            years_experience: years,
            category: def.category,
        });
    }

    debug!(skills = set.len(), "extracted skill set");
    Ok(set)
}

/// A ±`CONTEXT_WINDOW` character slice around a mention, snapped to char
/// boundaries.
fn context_window(text: &str, start: usize, end: usize) -> &str {
    let mut lo = start.saturating_sub(CONTEXT_WINDOW);
    while lo > 0 && !text.is_char_boundary(lo) {
        lo -= 1;
    }
    let mut hi = (end + CONTEXT_WINDOW).min(text.len());
    while hi < text.len() && !text.is_char_boundary(hi) {
        hi += 1;
    }
    &text[lo..hi]
}

fn detect_level(window: &str) -> Option<SkillLevel> {
    for (level, cues) in LEVEL_CUES {
        if cues.iter().any(|cue| window.contains(cue)) {
            return Some(*level);
        }
    }
    None
}

fn parse_years(window: &str) -> Option<f32> {
    YEARS_RE
        .captures(window)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f32>().ok())
}
