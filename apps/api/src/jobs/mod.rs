//! Posting model and the job source collaborator boundary.
//!
//! The engine never talks to a provider directly — it goes through the
//! [`JobSource`] trait carried in `AppState`, so tests swap in counting
//! fakes and the production binary wires up SerpAPI.

pub mod serpapi;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One fetched job posting. Immutable for the lifetime of a request; only
/// derived `MatchResult`s outlive it (inside a cache entry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub apply_link: Option<String>,
    /// Absolute timestamp parsed from the provider's relative date, when
    /// one was given.
    pub posted_at: Option<DateTime<Utc>>,
    pub employment_type: String,
    pub salary_range: String,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("job source unavailable: {0}")]
    Unavailable(String),

    #[error("job source request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("job source returned a malformed payload: {0}")]
    Malformed(String),
}

/// External job posting provider. May return fewer postings than `limit`.
#[async_trait]
pub trait JobSource: Send + Sync {
    async fn fetch(
        &self,
        query: &str,
        location: &str,
        limit: usize,
    ) -> Result<Vec<Posting>, SourceError>;
}

static HOURS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*hours?").unwrap());
static DAYS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*days?").unwrap());
static WEEKS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*weeks?").unwrap());
static MONTHS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*months?").unwrap());

/// Parses the relative posting dates providers emit ("3 days ago",
/// "2 weeks ago", "1 hour ago") into absolute timestamps. Unparseable or
/// vague values ("Recently") yield `None`; recency filtering then includes
/// the posting by default.
pub fn parse_posted_at(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let raw = raw.to_lowercase();

    if raw.contains("just posted") || raw.contains("today") {
        return Some(now);
    }
    if raw.contains("yesterday") {
        return Some(now - Duration::days(1));
    }
    if let Some(c) = HOURS_RE.captures(&raw) {
        let hours: i64 = c[1].parse().ok()?;
        return Some(now - Duration::hours(hours));
    }
    if let Some(c) = DAYS_RE.captures(&raw) {
        let days: i64 = c[1].parse().ok()?;
        return Some(now - Duration::days(days));
    }
    if let Some(c) = WEEKS_RE.captures(&raw) {
        let weeks: i64 = c[1].parse().ok()?;
        return Some(now - Duration::weeks(weeks));
    }
    if let Some(c) = MONTHS_RE.captures(&raw) {
        let months: i64 = c[1].parse().ok()?;
        return Some(now - Duration::days(months * 30));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        "2025-06-15T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_parse_days_ago() {
        let parsed = parse_posted_at("3 days ago", now()).unwrap();
        assert_eq!(now() - parsed, Duration::days(3));
    }

    #[test]
    fn test_parse_hours_ago() {
        let parsed = parse_posted_at("5 hours ago", now()).unwrap();
        assert_eq!(now() - parsed, Duration::hours(5));
    }

    #[test]
    fn test_parse_weeks_and_months() {
        assert_eq!(
            now() - parse_posted_at("2 weeks ago", now()).unwrap(),
            Duration::weeks(2)
        );
        assert_eq!(
            now() - parse_posted_at("1 month ago", now()).unwrap(),
            Duration::days(30)
        );
    }

    #[test]
    fn test_parse_singular_unit() {
        assert_eq!(
            now() - parse_posted_at("1 day ago", now()).unwrap(),
            Duration::days(1)
        );
    }

    #[test]
    fn test_vague_values_are_none() {
        assert!(parse_posted_at("Recently", now()).is_none());
        assert!(parse_posted_at("", now()).is_none());
        assert!(parse_posted_at("a while back", now()).is_none());
    }

    #[test]
    fn test_just_posted_is_now() {
        assert_eq!(parse_posted_at("Just posted", now()), Some(now()));
    }
}
