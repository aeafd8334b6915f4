//! Process-wide match cache with TTL expiry and single-flight request
//! collapsing.
//!
//! The cache is constructed once at startup and handed to the orchestrator
//! through `AppState` — never reached through ambient state. The clock is
//! injected so expiry is testable without waiting out a TTL.
//!
//! Single-flight: at most one computation runs per fingerprint. Concurrent
//! callers with the same fingerprint attach to the in-flight computation's
//! watch channel instead of starting duplicate external calls. The leader
//! runs the computation in a spawned task, so a caller disconnecting never
//! cancels work other waiters depend on. Failures are delivered to waiters
//! but never stored.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::models::matching::{CachedMatch, MatchRequest};

/// Time source seam. Production uses [`SystemClock`]; tests drive expiry
/// with a manual clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Error)]
#[error("shared computation failed: {0}")]
pub struct FlightFailed(pub String);

/// A successful cache read or computation.
#[derive(Debug)]
pub struct Lookup {
    pub value: CachedMatch,
    pub cache_hit: bool,
}

type FlightOutcome = Result<CachedMatch, String>;

struct StoredEntry {
    value: CachedMatch,
    fetched_at: DateTime<Utc>,
}

pub struct MatchCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, StoredEntry>>,
    inflight: Mutex<HashMap<String, watch::Receiver<Option<FlightOutcome>>>>,
}

impl MatchCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value for `key`, or runs `compute` — sharing one
    /// in-flight computation among all concurrent callers of the same key.
    ///
    /// `compute` resolves to `(value, store)`; `store = false` produces a
    /// result for this request without caching it (e.g. the job source was
    /// unreachable and the degraded result should not stick for 24h).
    pub async fn get_or_compute<F, Fut>(
        self: &Arc<Self>,
        key: &str,
        compute: F,
    ) -> Result<Lookup, FlightFailed>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(CachedMatch, bool), String>> + Send + 'static,
    {
        if let Some(value) = self.lookup(key) {
            debug!(key, "cache hit");
            return Ok(Lookup {
                value,
                cache_hit: true,
            });
        }

        let mut rx = {
            let mut inflight = self.inflight.lock().expect("inflight lock poisoned");
            match inflight.get(key) {
                Some(rx) => {
                    debug!(key, "joining in-flight computation");
                    rx.clone()
                }
                None => {
                    // A flight may have settled and stored between the
                    // lookup above and taking this lock.
                    if let Some(value) = self.lookup(key) {
                        return Ok(Lookup {
                            value,
                            cache_hit: true,
                        });
                    }

                    let (tx, rx) = watch::channel(None);
                    inflight.insert(key.to_string(), rx.clone());

                    let cache = Arc::clone(self);
                    let key_owned = key.to_string();
                    let fut = compute();
                    tokio::spawn(async move {
                        // The inner spawn isolates panics and keeps the
                        // computation alive if every caller disconnects.
                        let outcome: FlightOutcome = match tokio::spawn(fut).await {
                            Ok(Ok((value, store))) => {
                                if store {
                                    cache.store(&key_owned, value.clone());
                                }
                                Ok(value)
                            }
                            Ok(Err(e)) => Err(e),
                            Err(join_err) => Err(format!("computation aborted: {join_err}")),
                        };
                        // Deregister before publishing so a caller arriving
                        // after a failure starts fresh instead of receiving
                        // the stale error.
                        cache
                            .inflight
                            .lock()
                            .expect("inflight lock poisoned")
                            .remove(&key_owned);
                        let _ = tx.send(Some(outcome));
                    });

                    rx
                }
            }
        };

        let result = match rx.wait_for(|v| v.is_some()).await {
            Ok(guard) => match guard.as_ref().expect("settled flight has a value") {
                Ok(value) => Ok(Lookup {
                    value: value.clone(),
                    cache_hit: false,
                }),
                Err(e) => Err(FlightFailed(e.clone())),
            },
            Err(_) => Err(FlightFailed("computation channel closed".to_string())),
        };
        result
    }

    /// Lazy expiry check: a stale entry is evicted on read and treated as
    /// a miss. Entries are never served past `fetched_at + ttl`.
    fn lookup(&self, key: &str) -> Option<CachedMatch> {
        let mut entries = self.entries.lock().expect("entries lock poisoned");
        match entries.get(key) {
            Some(entry) if self.clock.now() < entry.fetched_at + self.ttl => {
                Some(entry.value.clone())
            }
            Some(_) => {
                debug!(key, "cache entry expired");
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn store(&self, key: &str, value: CachedMatch) {
        let mut entries = self.entries.lock().expect("entries lock poisoned");
        entries.insert(
            key.to_string(),
            StoredEntry {
                value,
                fetched_at: self.clock.now(),
            },
        );
    }

    /// Proactively removes expired entries. Optional — lazy expiry already
    /// guarantees correctness.
    pub fn sweep(&self) -> usize {
        let mut entries = self.entries.lock().expect("entries lock poisoned");
        let now = self.clock.now();
        let before = entries.len();
        entries.retain(|_, e| now < e.fetched_at + self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("entries lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawns the periodic sweep task.
    pub fn spawn_sweeper(self: &Arc<Self>, every: std::time::Duration) {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = cache.sweep();
                if evicted > 0 {
                    info!(evicted, "cache sweep evicted expired entries");
                }
            }
        });
    }
}

/// Deterministic cache key: sha256 over the normalized resume text, query,
/// location and the full filter set. Whitespace runs and case differences
/// in the text inputs do not produce distinct fingerprints.
pub fn request_fingerprint(req: &MatchRequest) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(&req.resume_text));
    hasher.update([0u8]);
    hasher.update(normalize(&req.job_query));
    hasher.update([0u8]);
    hasher.update(normalize(&req.location));
    hasher.update([0u8]);
    hasher.update(format!(
        "{}:{}:{}:{}:{}:{}",
        req.num_jobs,
        req.top_k,
        req.min_match_score,
        serde_json::to_string(&req.experience_level).unwrap_or_default(),
        req.posted_within_days.map_or(-1, |d| d),
        req.exclude_remote,
    ));

    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
