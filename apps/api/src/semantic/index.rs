//! Per-request vector index with exact cosine top-k retrieval.
//!
//! The posting pool per query is small (≤100), so retrieval is a full scan —
//! no approximate index, no persistence. Rebuilt for every cache miss.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("cannot index or query a zero-norm vector")]
    ZeroNormVector,
}

/// A scored retrieval hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Similarity {
    pub posting_id: String,
    /// Cosine similarity mapped into [0, 1].
    pub score: f64,
}

struct Entry {
    posting_id: String,
    posted_at: Option<DateTime<Utc>>,
    embedding: Vec<f32>,
    norm: f32,
}

pub struct VectorIndex {
    dimensions: usize,
    entries: Vec<Entry>,
}

impl VectorIndex {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds one posting embedding. Rejects wrong dimensions and zero-norm
    /// vectors (they cannot participate in cosine similarity).
    pub fn insert(
        &mut self,
        posting_id: String,
        posted_at: Option<DateTime<Utc>>,
        embedding: Vec<f32>,
    ) -> Result<(), IndexError> {
        if embedding.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                got: embedding.len(),
            });
        }
        let norm = l2_norm(&embedding);
        if norm < f32::EPSILON {
            return Err(IndexError::ZeroNormVector);
        }
        self.entries.push(Entry {
            posting_id,
            posted_at,
            embedding,
            norm,
        });
        Ok(())
    }

    /// Exact top-`k` by cosine similarity. Ties break by posting recency
    /// (more recent wins, a known date beats an unknown one), then by
    /// insertion order.
    pub fn query(&self, query: &[f32], k: usize) -> Result<Vec<Similarity>, IndexError> {
        if query.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                got: query.len(),
            });
        }
        let query_norm = l2_norm(query);
        if query_norm < f32::EPSILON {
            return Err(IndexError::ZeroNormVector);
        }

        let mut scored: Vec<(usize, f64)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let dot: f32 = query
                    .iter()
                    .zip(entry.embedding.iter())
                    .map(|(a, b)| a * b)
                    .sum();
                let cosine = (dot / (query_norm * entry.norm)) as f64;
                (i, cosine.clamp(0.0, 1.0))
            })
            .collect();

        scored.sort_by(|(ia, sa), (ib, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    let ra = self.entries[*ia].posted_at;
                    let rb = self.entries[*ib].posted_at;
                    rb.cmp(&ra) // Some(later) first, None last
                })
                .then_with(|| ia.cmp(ib))
        });

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, score)| Similarity {
                posting_id: self.entries[i].posting_id.clone(),
                score,
            })
            .collect())
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
