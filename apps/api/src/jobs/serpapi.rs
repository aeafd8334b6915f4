//! SerpAPI Google Jobs implementation of [`JobSource`].

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::{parse_posted_at, JobSource, Posting, SourceError};

const SERPAPI_URL: &str = "https://serpapi.com/search.json";
const FETCH_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);
/// SerpAPI caps a single google_jobs page around this size.
const MAX_RESULTS_PER_CALL: usize = 50;

pub struct SerpApiSource {
    client: reqwest::Client,
    api_key: String,
}

impl SerpApiSource {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            api_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    jobs_results: Vec<RawJob>,
}

#[derive(Debug, Default, Deserialize)]
struct RawJob {
    job_id: Option<String>,
    title: Option<String>,
    company_name: Option<String>,
    location: Option<String>,
    description: Option<String>,
    share_link: Option<String>,
    apply_link: Option<String>,
    #[serde(default)]
    detected_extensions: Extensions,
}

#[derive(Debug, Default, Deserialize)]
struct Extensions {
    employment_type: Option<String>,
    salary: Option<String>,
    posted_at: Option<String>,
}

#[async_trait]
impl JobSource for SerpApiSource {
    async fn fetch(
        &self,
        query: &str,
        location: &str,
        limit: usize,
    ) -> Result<Vec<Posting>, SourceError> {
        let num = limit.min(MAX_RESULTS_PER_CALL);
        info!(query, location, num, "fetching postings from SerpAPI");

        let num = num.to_string();
        let response = self
            .client
            .get(SERPAPI_URL)
            .query(&[
                ("engine", "google_jobs"),
                ("q", query),
                ("location", location),
                ("api_key", self.api_key.as_str()),
                ("num", num.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Unavailable(format!(
                "SerpAPI returned {status}: {body}"
            )));
        }

        let payload: SearchResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        let postings: Vec<Posting> = payload
            .jobs_results
            .into_iter()
            .map(transform)
            .collect();

        info!(count = postings.len(), "transformed postings");
        Ok(postings)
    }
}

/// Maps a raw provider record into a `Posting`, tolerating absent fields.
/// Postings that come through with empty required fields are dropped later
/// by the quality filter, not here.
fn transform(raw: RawJob) -> Posting {
    let posted_at = raw
        .detected_extensions
        .posted_at
        .as_deref()
        .and_then(|p| parse_posted_at(p, Utc::now()));

    if raw.title.is_none() {
        warn!("provider posting without a title");
    }

    Posting {
        id: raw
            .job_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        title: raw.title.unwrap_or_default(),
        company: raw.company_name.unwrap_or_default(),
        location: raw.location.unwrap_or_default(),
        description: raw.description.unwrap_or_default(),
        apply_link: raw
            .share_link
            .or(raw.apply_link)
            .filter(|l| !l.is_empty()),
        posted_at,
        employment_type: raw
            .detected_extensions
            .employment_type
            .unwrap_or_else(|| "Full-time".to_string()),
        salary_range: raw
            .detected_extensions
            .salary
            .unwrap_or_else(|| "Not specified".to_string()),
    }
}
