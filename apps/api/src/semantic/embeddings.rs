//! Text encoder seam and the fastembed-backed production implementation.
//!
//! The encoder is a pure `text -> vector` function as far as the engine is
//! concerned; the trait keeps the model swappable and lets tests inject a
//! deterministic fake instead of downloading model weights.

use std::sync::Mutex;

use fastembed::{InitOptions, TextEmbedding};
use thiserror::Error;
use tracing::info;

/// Same model family the matching quality was tuned against.
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding model initialization failed: {0}")]
    InitFailed(String),

    #[error("embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("unknown embedding model: {0}")]
    InvalidModel(String),
}

/// Fixed-dimension text encoder.
pub trait TextEmbedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
    fn dimensions(&self) -> usize;
}

/// fastembed-backed encoder. The Mutex is required because fastembed's
/// `embed()` takes `&mut self`.
pub struct FastembedEncoder {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimensions: usize,
}

impl FastembedEncoder {
    /// Loads (downloading on first use) the named model and probes its
    /// output dimensions.
    pub fn new(model_name: &str) -> Result<Self, EmbeddingError> {
        let options = InitOptions::new(parse_model_name(model_name)?)
            .with_show_download_progress(false);

        let mut model = TextEmbedding::try_new(options)
            .map_err(|e| EmbeddingError::InitFailed(e.to_string()))?;

        let dimensions = probe_dimensions(&mut model)?;
        info!(model = model_name, dimensions, "embedding model ready");

        Ok(Self {
            model: Mutex::new(model),
            model_name: model_name.to_string(),
            dimensions,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl TextEmbedder for FastembedEncoder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_batch(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::EmbeddingFailed("no embedding returned".to_string()))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let mut model = self
            .model
            .lock()
            .map_err(|e| EmbeddingError::EmbeddingFailed(format!("model lock poisoned: {e}")))?;
        model
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbeddingError::EmbeddingFailed(e.to_string()))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

fn parse_model_name(name: &str) -> Result<fastembed::EmbeddingModel, EmbeddingError> {
    match name.to_lowercase().as_str() {
        "all-minilm-l6-v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
        "all-minilm-l6-v2-q" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2Q),
        "bge-small-en-v1.5" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
        _ => Err(EmbeddingError::InvalidModel(format!(
            "{name} (supported: all-MiniLM-L6-v2, all-MiniLM-L6-v2-q, bge-small-en-v1.5, bge-base-en-v1.5)"
        ))),
    }
}

fn probe_dimensions(model: &mut TextEmbedding) -> Result<usize, EmbeddingError> {
    let probe = model
        .embed(vec!["probe"], None)
        .map_err(|e| EmbeddingError::InitFailed(format!("dimension probe failed: {e}")))?;
    probe
        .first()
        .map(|v| v.len())
        .ok_or_else(|| EmbeddingError::InitFailed("model returned no embedding".to_string()))
}
