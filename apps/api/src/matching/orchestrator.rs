//! Matching orchestrator: validates the request, consults the cache, and on
//! a miss runs fetch -> quality filter -> skill extraction -> semantic
//! retrieval -> hybrid scoring -> gap analysis -> explanation.
//!
//! Only invalid input is an error to the caller. Every collaborator failure
//! (job source, embeddings, explanation) degrades the response and is
//! reported through the `warnings` list instead.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::cache::request_fingerprint;
use crate::errors::AppError;
use crate::jobs::Posting;
use crate::matching::{explain, quality, scorer};
use crate::models::matching::{CachedMatch, MatchRequest, MatchResponse};
use crate::semantic::index::{Similarity, VectorIndex};
use crate::semantic::posting_document;
use crate::skills::extractor::{self, TextOrigin};
use crate::skills::{gap, SkillSet};
use crate::state::AppState;

const MAX_NUM_JOBS: usize = 100;
/// Per embedding batch. The model runs locally, but a cold start can stall.
const EMBED_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);
/// The explanation call; the LLM client retries within this budget.
const EXPLAIN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(15);

/// Entry point for POST /api/v1/match.
pub async fn match_jobs(state: AppState, req: MatchRequest) -> Result<MatchResponse, AppError> {
    // Reject invalid input before any external call.
    if req.resume_text.trim().is_empty() {
        return Err(AppError::Validation("resume_text must not be empty".to_string()));
    }
    if req.job_query.trim().is_empty() {
        return Err(AppError::Validation("job_query must not be empty".to_string()));
    }

    let req = clamp_request(req);
    let query = req.job_query.clone();
    let location = req.location.clone();

    if !req.use_cache {
        let (value, _) = compute_match(state, req)
            .await
            .unwrap_or_else(|e| (degraded(e), false));
        return Ok(MatchResponse::from_cached(value, query, location, false));
    }

    let fingerprint = request_fingerprint(&req);
    let cache = Arc::clone(&state.cache);
    let lookup = cache
        .get_or_compute(&fingerprint, move || compute_match(state, req))
        .await;

    match lookup {
        Ok(lookup) => Ok(MatchResponse::from_cached(
            lookup.value,
            query,
            location,
            lookup.cache_hit,
        )),
        Err(e) => {
            warn!(error = %e, "shared match computation failed");
            Ok(MatchResponse::from_cached(
                degraded(e.0),
                query,
                location,
                false,
            ))
        }
    }
}

fn clamp_request(mut req: MatchRequest) -> MatchRequest {
    req.job_query = req.job_query.trim().to_string();
    req.location = req.location.trim().to_string();
    if req.location.is_empty() {
        req.location = "India".to_string();
    }
    req.num_jobs = req.num_jobs.clamp(1, MAX_NUM_JOBS);
    req.top_k = req.top_k.clamp(1, req.num_jobs);
    req
}

fn degraded(warning: String) -> CachedMatch {
    CachedMatch {
        warnings: vec![warning],
        ..CachedMatch::default()
    }
}

/// The cache-miss pipeline. Returns `(payload, store)`; results produced
/// while the job source was unreachable are served but not cached.
async fn compute_match(
    state: AppState,
    req: MatchRequest,
) -> Result<(CachedMatch, bool), String> {
    let mut warnings: Vec<String> = Vec::new();

    let postings = match state
        .job_source
        .fetch(&req.job_query, &req.location, req.num_jobs)
        .await
    {
        Ok(postings) => postings,
        Err(e) => {
            warn!(error = %e, "job fetch failed, degrading to empty result set");
            warnings.push(format!("job source unavailable: {e}"));
            return Ok((
                CachedMatch {
                    warnings,
                    ..CachedMatch::default()
                },
                false,
            ));
        }
    };

    let total_jobs_fetched = postings.len();
    if postings.is_empty() {
        warnings.push(format!(
            "no postings found for '{}' in '{}'",
            req.job_query, req.location
        ));
        return Ok((
            CachedMatch {
                warnings,
                ..CachedMatch::default()
            },
            false,
        ));
    }

    let postings = quality::filter(postings);
    let filters = quality::RequestFilters {
        experience_level: req.experience_level,
        posted_within_days: req.posted_within_days,
        exclude_remote: req.exclude_remote,
    };
    let postings = quality::apply_request_filters(postings, &filters, Utc::now());

    let resume_skills = match extractor::extract(&req.resume_text, TextOrigin::Resume) {
        Ok(skills) => skills,
        Err(e) => {
            warnings.push(format!("resume skill extraction failed: {e}"));
            SkillSet::new()
        }
    };

    // Malformed posting text means zero skills for that posting, never an
    // error for the request.
    let posting_skills: Vec<SkillSet> = postings
        .iter()
        .map(|p| {
            extractor::extract(
                &format!("{} {}", p.title, p.description),
                TextOrigin::JobRequirement,
            )
            .unwrap_or_default()
        })
        .collect();

    let (retrieved, total_jobs_indexed) = match retrieve(
        &state,
        &req.resume_text,
        &postings,
        &posting_skills,
        req.top_k,
    )
    .await
    {
        Ok((hits, indexed)) => (hits, indexed),
        Err(e) => {
            warn!(error = %e, "semantic retrieval failed, falling back to skill-only scoring");
            warnings.push(format!("semantic retrieval unavailable: {e}"));
            let hits = postings
                .iter()
                .take(req.top_k)
                .map(|p| Similarity {
                    posting_id: p.id.clone(),
                    score: 0.0,
                })
                .collect();
            (hits, 0)
        }
    };

    let by_id: HashMap<&str, (&Posting, &SkillSet)> = postings
        .iter()
        .zip(posting_skills.iter())
        .map(|(p, s)| (p.id.as_str(), (p, s)))
        .collect();

    let mut results = Vec::with_capacity(retrieved.len());
    for hit in &retrieved {
        if let Some((posting, skills)) = by_id.get(hit.posting_id.as_str()) {
            results.push(scorer::score(&resume_skills, posting, skills, hit.score));
        }
    }

    scorer::rank(&mut results);
    results.retain(|r| r.match_score >= req.min_match_score);
    results.truncate(req.top_k);

    let skill_comparison = results.first().map(|best| {
        let scores: Vec<f64> = results.iter().map(|r| r.match_score).collect();
        let (_, best_skills) = by_id[best.posting_id.as_str()];
        gap::analyze(&resume_skills, best_skills, &scores)
    });

    let mut career_advice = None;
    if !results.is_empty() {
        let context = explain::ExplainContext::new(&resume_skills, &results, skill_comparison.as_ref());
        match timeout(EXPLAIN_TIMEOUT, state.explainer.explain(&context)).await {
            Ok(Ok(explanation)) => {
                for result in &mut results {
                    result.explanation = explanation
                        .explanations
                        .get(&result.posting_id)
                        .cloned()
                        .unwrap_or_else(|| explain::fallback_explanation(result));
                }
                career_advice = explanation.career_advice;
            }
            Ok(Err(e)) => {
                warnings.push(format!("explanation generator unavailable: {e}"));
                apply_fallback_explanations(&mut results);
            }
            Err(_) => {
                warnings.push("explanation generator timed out".to_string());
                apply_fallback_explanations(&mut results);
            }
        }
    }

    info!(
        fetched = total_jobs_fetched,
        indexed = total_jobs_indexed,
        matched = results.len(),
        "match pipeline complete"
    );

    Ok((
        CachedMatch {
            results,
            skill_comparison,
            career_advice,
            total_jobs_fetched,
            total_jobs_indexed,
            warnings,
        },
        true,
    ))
}

fn apply_fallback_explanations(results: &mut [crate::models::matching::MatchResult]) {
    for result in results.iter_mut() {
        result.explanation = explain::fallback_explanation(result);
    }
}

/// Embeds the resume and all posting documents (off the async runtime, with
/// a batch timeout), builds the per-request index, and returns the exact
/// top-k hits plus the number of postings indexed.
async fn retrieve(
    state: &AppState,
    resume_text: &str,
    postings: &[Posting],
    posting_skills: &[SkillSet],
    k: usize,
) -> Result<(Vec<Similarity>, usize), String> {
    if postings.is_empty() {
        return Ok((Vec::new(), 0));
    }

    let documents: Vec<String> = postings
        .iter()
        .zip(posting_skills.iter())
        .map(|(p, s)| posting_document(p, s))
        .collect();

    let embedder = Arc::clone(&state.embedder);
    let resume = resume_text.to_string();
    let handle = tokio::task::spawn_blocking(move || {
        let posting_vectors = embedder.embed_batch(&documents).map_err(|e| e.to_string())?;
        let resume_vector = embedder.embed(&resume).map_err(|e| e.to_string())?;
        Ok::<_, String>((posting_vectors, resume_vector))
    });

    let (posting_vectors, resume_vector) = timeout(EMBED_TIMEOUT, handle)
        .await
        .map_err(|_| "embedding batch timed out".to_string())?
        .map_err(|e| format!("embedding task failed: {e}"))??;

    let mut index = VectorIndex::new(resume_vector.len());
    let mut indexed = 0;
    for (posting, vector) in postings.iter().zip(posting_vectors) {
        match index.insert(posting.id.clone(), posting.posted_at, vector) {
            Ok(()) => indexed += 1,
            Err(e) => warn!(posting_id = %posting.id, error = %e, "skipping unindexable posting"),
        }
    }

    let hits = index.query(&resume_vector, k).map_err(|e| e.to_string())?;
    Ok((hits, indexed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Duration;

    use crate::cache::{Clock, MatchCache, SystemClock};
    use crate::config::Config;
    use crate::jobs::{JobSource, SourceError};
    use crate::matching::explain::{ExplainContext, ExplainError, Explainer, Explanation};
    use crate::semantic::embeddings::{EmbeddingError, TextEmbedder};

    // ── Mock collaborators ──────────────────────────────────────────────

    struct FakeJobSource {
        postings: Vec<Posting>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeJobSource {
        fn with(postings: Vec<Posting>) -> Arc<Self> {
            Arc::new(Self {
                postings,
                fail: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                postings: vec![],
                fail: true,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl JobSource for FakeJobSource {
        async fn fetch(
            &self,
            _query: &str,
            _location: &str,
            limit: usize,
        ) -> Result<Vec<Posting>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SourceError::Unavailable("connection refused".to_string()));
            }
            Ok(self.postings.iter().take(limit).cloned().collect())
        }
    }

    /// Deterministic bag-of-taxonomy-words encoder: each dimension counts
    /// mentions of one canonical skill, so related texts land near each
    /// other.
    struct FakeEmbedder {
        calls: AtomicUsize,
        fail: bool,
    }

    impl FakeEmbedder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: true,
            })
        }

        fn encode(text: &str) -> Vec<f32> {
            let lower = text.to_lowercase();
            let mut v: Vec<f32> = crate::skills::taxonomy::TAXONOMY
                .iter()
                .map(|def| def.mentions(&lower).count() as f32)
                .collect();
            // Constant tail component keeps vectors away from zero norm.
            v.push(1.0);
            v
        }
    }

    impl TextEmbedder for FakeEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(EmbeddingError::EmbeddingFailed("fake failure".to_string()));
            }
            Ok(Self::encode(text))
        }

        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(EmbeddingError::EmbeddingFailed("fake failure".to_string()));
            }
            Ok(texts.iter().map(|t| Self::encode(t)).collect())
        }

        fn dimensions(&self) -> usize {
            crate::skills::taxonomy::TAXONOMY.len() + 1
        }
    }

    struct FakeExplainer {
        calls: AtomicUsize,
        fail: bool,
    }

    impl FakeExplainer {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: true,
            })
        }
    }

    #[async_trait]
    impl Explainer for FakeExplainer {
        async fn explain(&self, context: &ExplainContext) -> Result<Explanation, ExplainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ExplainError::NotConfigured);
            }
            let explanations = context
                .results
                .iter()
                .map(|r| (r.posting_id.clone(), format!("Explained {}", r.title)))
                .collect();
            Ok(Explanation {
                explanations,
                career_advice: None,
            })
        }
    }

    fn test_config() -> Config {
        Config {
            serpapi_key: "test-key".to_string(),
            anthropic_api_key: None,
            port: 0,
            rust_log: "info".to_string(),
            cache_ttl_hours: 24,
            embedding_model: "fake".to_string(),
        }
    }

    fn state_with(
        source: Arc<FakeJobSource>,
        embedder: Arc<FakeEmbedder>,
        explainer: Arc<FakeExplainer>,
    ) -> AppState {
        AppState {
            config: test_config(),
            job_source: source,
            embedder,
            explainer,
            cache: Arc::new(MatchCache::new(
                Duration::hours(24),
                Arc::new(SystemClock) as Arc<dyn Clock>,
            )),
        }
    }

    fn posting(id: &str, title: &str, description: &str) -> Posting {
        Posting {
            id: id.to_string(),
            title: title.to_string(),
            company: "Acme Systems".to_string(),
            location: "Bengaluru, India".to_string(),
            description: description.to_string(),
            apply_link: Some("https://example.com/apply".to_string()),
            posted_at: None,
            employment_type: "Full-time".to_string(),
            salary_range: "Not specified".to_string(),
        }
    }

    fn python_posting() -> Posting {
        posting(
            "py-1",
            "Python Backend Engineer",
            &format!(
                "We need strong Python and Docker skills, with PostgreSQL experience. \
                 Benefits and career growth. {}",
                "You will build and operate production services. ".repeat(10)
            ),
        )
    }

    fn request(resume: &str, query: &str) -> MatchRequest {
        serde_json::from_value(serde_json::json!({
            "resume_text": resume,
            "job_query": query,
        }))
        .unwrap()
    }

    // ── Tests ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_empty_resume_rejected_before_any_external_call() {
        let source = FakeJobSource::with(vec![python_posting()]);
        let state = state_with(Arc::clone(&source), FakeEmbedder::new(), FakeExplainer::new());

        let err = match_jobs(state, request("   ", "backend")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let state = state_with(
            FakeJobSource::with(vec![]),
            FakeEmbedder::new(),
            FakeExplainer::new(),
        );
        let err = match_jobs(state, request("Python dev", "")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_happy_path_produces_scored_matches() {
        let state = state_with(
            FakeJobSource::with(vec![python_posting()]),
            FakeEmbedder::new(),
            FakeExplainer::new(),
        );

        let response = match_jobs(
            state,
            request(
                "Expert in Python with 6+ years. Proficient with Docker and PostgreSQL.",
                "python backend",
            ),
        )
        .await
        .unwrap();

        assert_eq!(response.total_jobs_fetched, 1);
        assert_eq!(response.total_jobs_indexed, 1);
        assert_eq!(response.matched_jobs.len(), 1);
        let result = &response.matched_jobs[0];
        assert!(result.match_score > 40.0);
        assert!(result.matched_skills.iter().any(|s| s.name == "python"));
        assert_eq!(result.explanation, "Explained Python Backend Engineer");
        assert!(response.skill_comparison.is_some());
        assert!(!response.cache_used);
    }

    #[tokio::test]
    async fn test_source_failure_degrades_to_empty_with_warning() {
        let state = state_with(
            FakeJobSource::failing(),
            FakeEmbedder::new(),
            FakeExplainer::new(),
        );

        let response = match_jobs(state, request("Python dev", "backend"))
            .await
            .unwrap();
        assert!(response.matched_jobs.is_empty());
        assert_eq!(response.total_jobs_fetched, 0);
        assert!(response
            .warnings
            .iter()
            .any(|w| w.contains("job source unavailable")));
    }

    #[tokio::test]
    async fn test_scam_only_pool_yields_fetched_greater_than_indexed() {
        let scam = posting(
            "scam-1",
            "Work From Home - Earn $$$",
            "Make $$$ fast! No experience needed! Commission only.",
        );
        let state = state_with(
            FakeJobSource::with(vec![scam]),
            FakeEmbedder::new(),
            FakeExplainer::new(),
        );

        let response = match_jobs(state, request("Python dev with Docker", "python"))
            .await
            .unwrap();
        assert_eq!(response.total_jobs_fetched, 1);
        assert_eq!(response.total_jobs_indexed, 0);
        assert!(response.matched_jobs.is_empty());
        assert!(response.total_jobs_fetched > response.total_jobs_indexed);
    }

    #[tokio::test]
    async fn test_embedding_failure_falls_back_to_skill_only() {
        let state = state_with(
            FakeJobSource::with(vec![python_posting()]),
            FakeEmbedder::failing(),
            FakeExplainer::new(),
        );

        let mut req = request(
            "Expert in Python with 6+ years. Proficient with Docker and PostgreSQL.",
            "python backend",
        );
        req.min_match_score = 0.0;

        let response = match_jobs(state, req).await.unwrap();
        assert!(response
            .warnings
            .iter()
            .any(|w| w.contains("semantic retrieval unavailable")));
        assert_eq!(response.total_jobs_indexed, 0);
        assert_eq!(response.matched_jobs.len(), 1);
        assert_eq!(response.matched_jobs[0].semantic_score, 0.0);
        assert!(response.matched_jobs[0].skill_score > 0.0);
    }

    #[tokio::test]
    async fn test_explainer_failure_uses_fallback_text() {
        let state = state_with(
            FakeJobSource::with(vec![python_posting()]),
            FakeEmbedder::new(),
            FakeExplainer::failing(),
        );

        let response = match_jobs(
            state,
            request(
                "Expert in Python with 6+ years. Proficient with Docker and PostgreSQL.",
                "python backend",
            ),
        )
        .await
        .unwrap();

        assert_eq!(response.matched_jobs.len(), 1);
        assert!(!response.matched_jobs[0].explanation.is_empty());
        assert!(response.matched_jobs[0]
            .explanation
            .contains("based on skill analysis"));
        assert!(response
            .warnings
            .iter()
            .any(|w| w.contains("explanation generator unavailable")));
        assert!(response.career_advice.is_none());
    }

    #[tokio::test]
    async fn test_min_match_score_filters_results() {
        let unrelated = posting(
            "far-1",
            "Marketing Copywriter",
            &format!(
                "Write brand copy and social campaigns. Benefits and career growth. {}",
                "Own the editorial calendar end to end. ".repeat(10)
            ),
        );
        let state = state_with(
            FakeJobSource::with(vec![unrelated]),
            FakeEmbedder::new(),
            FakeExplainer::new(),
        );

        let mut req = request("Expert in Python and Docker.", "python");
        req.min_match_score = 90.0;

        let response = match_jobs(state, req).await.unwrap();
        assert!(response.matched_jobs.is_empty());
        assert_eq!(response.total_jobs_fetched, 1);
    }

    #[tokio::test]
    async fn test_concurrent_identical_requests_compute_once() {
        let source = FakeJobSource::with(vec![python_posting()]);
        let embedder = FakeEmbedder::new();
        let explainer = FakeExplainer::new();
        let state = state_with(Arc::clone(&source), Arc::clone(&embedder), Arc::clone(&explainer));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let state = state.clone();
            handles.push(tokio::spawn(async move {
                match_jobs(
                    state,
                    request("Expert in Python with Docker.", "python backend"),
                )
                .await
                .unwrap()
            }));
        }

        for handle in handles {
            let response = handle.await.unwrap();
            assert_eq!(response.matched_jobs.len(), 1);
        }

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(explainer.calls.load(Ordering::SeqCst), 1);
        // One batch call for the postings plus one for the resume.
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_second_request_hits_cache() {
        let source = FakeJobSource::with(vec![python_posting()]);
        let state = state_with(Arc::clone(&source), FakeEmbedder::new(), FakeExplainer::new());

        let first = match_jobs(state.clone(), request("Python dev with Docker", "python"))
            .await
            .unwrap();
        assert!(!first.cache_used);

        let second = match_jobs(state, request("Python dev with Docker", "python"))
            .await
            .unwrap();
        assert!(second.cache_used);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            first.matched_jobs[0].match_score,
            second.matched_jobs[0].match_score
        );
    }

    #[tokio::test]
    async fn test_use_cache_false_bypasses_cache() {
        let source = FakeJobSource::with(vec![python_posting()]);
        let state = state_with(Arc::clone(&source), FakeEmbedder::new(), FakeExplainer::new());

        let mut req = request("Python dev with Docker", "python");
        req.use_cache = false;

        match_jobs(state.clone(), req.clone()).await.unwrap();
        match_jobs(state, req).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_top_k_limits_results() {
        let postings: Vec<Posting> = (0..8)
            .map(|i| {
                posting(
                    &format!("p{i}"),
                    &format!("Python Engineer {i}"),
                    &format!(
                        "Python role number {i} with benefits and career growth. {}",
                        "Build and run services. ".repeat(10)
                    ),
                )
            })
            .collect();
        let state = state_with(
            FakeJobSource::with(postings),
            FakeEmbedder::new(),
            FakeExplainer::new(),
        );

        let mut req = request("Expert Python developer with 6+ years", "python");
        req.top_k = 3;
        req.min_match_score = 0.0;

        let response = match_jobs(state, req).await.unwrap();
        assert_eq!(response.total_jobs_fetched, 8);
        assert_eq!(response.matched_jobs.len(), 3);
    }
}
