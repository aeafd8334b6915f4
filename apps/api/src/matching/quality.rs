//! Quality filtering of fetched postings, plus the request-level filters
//! (experience band, recency, remote exclusion).
//!
//! Deterministic given the same input and rule set — no randomness, no
//! external calls. The only side effect is logging how many postings were
//! dropped.

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use crate::jobs::Posting;
use crate::models::matching::ExperienceLevel;

const BASE_SCORE: f64 = 50.0;
const RED_FLAG_WEIGHT: f64 = 20.0;
const QUALITY_INDICATOR_WEIGHT: f64 = 5.0;
const MIN_QUALITY_SCORE: f64 = 40.0;
/// A single red flag is already disqualifying.
const RED_FLAG_LIMIT: usize = 1;

/// Phrases that mark likely scams or junk listings.
static RED_FLAGS: &[&str] = &[
    "work from home - no experience",
    "no experience needed",
    "earn money fast",
    "make $$$",
    "wire transfer",
    "pay to apply",
    "commission only",
    "pyramid",
    "multi-level marketing",
    "mlm",
];

/// Phrases that signal a real employer wrote the posting.
static QUALITY_INDICATORS: &[&str] = &[
    "competitive salary",
    "benefits",
    "401k",
    "health insurance",
    "remote option",
    "hybrid",
    "career growth",
    "training provided",
];

/// Drops postings that fail the quality bar: empty required fields, any
/// red-flag phrase, or a quality score below the minimum.
pub fn filter(postings: Vec<Posting>) -> Vec<Posting> {
    let total = postings.len();
    let kept: Vec<Posting> = postings.into_iter().filter(passes).collect();
    if kept.len() < total {
        info!(
            dropped = total - kept.len(),
            kept = kept.len(),
            "quality filter dropped postings"
        );
    }
    kept
}

fn passes(posting: &Posting) -> bool {
    if posting.title.trim().is_empty()
        || posting.company.trim().is_empty()
        || posting.description.trim().is_empty()
    {
        return false;
    }
    if red_flag_count(posting) >= RED_FLAG_LIMIT {
        return false;
    }
    quality_score(posting) >= MIN_QUALITY_SCORE
}

fn full_text(posting: &Posting) -> String {
    format!(
        "{} {} {}",
        posting.title, posting.description, posting.company
    )
    .to_lowercase()
}

fn red_flag_count(posting: &Posting) -> usize {
    let text = full_text(posting);
    RED_FLAGS.iter().filter(|flag| text.contains(*flag)).count()
}

/// 0-100 quality score, recorded for observability — not returned to the
/// caller.
pub fn quality_score(posting: &Posting) -> f64 {
    let text = full_text(posting);
    let mut score = BASE_SCORE;

    score -= red_flag_count(posting) as f64 * RED_FLAG_WEIGHT;
    score += QUALITY_INDICATORS
        .iter()
        .filter(|ind| text.contains(*ind))
        .count() as f64
        * QUALITY_INDICATOR_WEIGHT;

    // Detailed descriptions correlate with legitimate postings.
    if posting.description.len() > 500 {
        score += 10.0;
    } else if posting.description.len() < 100 {
        score -= 10.0;
    }

    let company = posting.company.trim();
    if company.len() > 3 && !company.chars().any(|c| c.is_ascii_digit()) {
        score += 5.0;
    }

    if posting.apply_link.is_some() {
        score += 5.0;
    }

    score.clamp(0.0, 100.0)
}

static ENTRY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(entry.?level|junior|0-2\s*years?|fresher|graduate)\b").unwrap());
static MID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(mid.?level|intermediate|2-5\s*years?|3-5\s*years?)\b").unwrap());
static SENIOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(senior|lead|5\+?\s*years?|7\+?\s*years?|expert)\b").unwrap());
static REMOTE_KEYWORDS: &[&str] = &["remote", "work from home", "wfh", "anywhere"];

/// The per-request filters from §6 request parameters.
#[derive(Debug, Clone, Default)]
pub struct RequestFilters {
    pub experience_level: Option<ExperienceLevel>,
    pub posted_within_days: Option<i64>,
    pub exclude_remote: bool,
}

pub fn apply_request_filters(
    postings: Vec<Posting>,
    filters: &RequestFilters,
    now: DateTime<Utc>,
) -> Vec<Posting> {
    let total = postings.len();
    let kept: Vec<Posting> = postings
        .into_iter()
        .filter(|p| {
            if let Some(level) = filters.experience_level {
                if !matches_experience(p, level) {
                    return false;
                }
            }
            if let Some(max_days) = filters.posted_within_days {
                if !is_recent(p, max_days, now) {
                    return false;
                }
            }
            if filters.exclude_remote && is_remote(p) {
                return false;
            }
            true
        })
        .collect();

    if kept.len() < total {
        info!(
            dropped = total - kept.len(),
            "request filters dropped postings"
        );
    }
    kept
}

fn matches_experience(posting: &Posting, level: ExperienceLevel) -> bool {
    let text = format!("{} {}", posting.title, posting.description).to_lowercase();
    let pattern = match level {
        ExperienceLevel::Entry => &*ENTRY_RE,
        ExperienceLevel::Mid => &*MID_RE,
        ExperienceLevel::Senior => &*SENIOR_RE,
    };
    pattern.is_match(&text)
}

/// Unknown posting dates pass the recency filter by default.
fn is_recent(posting: &Posting, max_days: i64, now: DateTime<Utc>) -> bool {
    match posting.posted_at {
        Some(posted) => now - posted <= Duration::days(max_days),
        None => true,
    }
}

fn is_remote(posting: &Posting) -> bool {
    let location = posting.location.to_lowercase();
    let description = posting.description.to_lowercase();
    REMOTE_KEYWORDS
        .iter()
        .any(|kw| location.contains(kw) || description.contains(kw))
}
