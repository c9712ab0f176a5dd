//! Text-to-vector embedding pipeline.
//!
//! Provides the [`EmbeddingProvider`] trait and two implementations:
//! [`local::LocalEmbeddingProvider`] (all-MiniLM-L6-v2 through ONNX Runtime) and
//! [`hashed::HashedEmbeddingProvider`] (deterministic feature hashing, no model files).
//! The provider is created via [`create_provider`] from configuration.

pub mod download;
pub mod hashed;
pub mod local;

use thiserror::Error;

/// Number of dimensions in the embedding vectors (all-MiniLM-L6-v2).
pub const EMBEDDING_DIM: usize = 384;

/// Embedding failures. Every variant maps to a provider error upstream.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("model loading failed: {0}")]
    ModelLoad(String),

    #[error("tokenization failed: {0}")]
    Tokenizer(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("embedding has {actual} dimensions, expected {expected}")]
    Dimension { expected: usize, actual: usize },

    #[error("embedding contains non-finite values")]
    NonFinite,

    #[error("embedding has zero magnitude")]
    ZeroNorm,

    #[error("no embeddable content in input")]
    EmptyInput,

    #[error("unknown embedding provider: {0}. Supported: local, hashed")]
    UnknownProvider(String),
}

/// Trait for embedding text into vectors.
///
/// Implementations produce L2-normalized vectors of exactly [`dimensions`](Self::dimensions)
/// entries. All methods are synchronous; callers in async contexts should use
/// `tokio::task::spawn_blocking`.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    /// Embed a batch of text strings. Implementations may override for batched inference.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Return the number of dimensions this provider produces.
    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }

    /// Identifier recorded in `schema_meta` so vectors from different models are never mixed.
    fn model_name(&self) -> &str;
}

/// Create an embedding provider from config.
///
/// `"local"` needs the ONNX model on disk; run `cinesift model download` first.
/// `"hashed"` works offline and is deterministic, at the cost of lexical-only similarity.
pub fn create_provider(
    config: &crate::config::EmbeddingConfig,
) -> Result<Box<dyn EmbeddingProvider>, EmbedError> {
    match config.provider.as_str() {
        "local" => Ok(Box::new(local::LocalEmbeddingProvider::new(config)?)),
        "hashed" => Ok(Box::new(hashed::HashedEmbeddingProvider::new(EMBEDDING_DIM))),
        other => Err(EmbedError::UnknownProvider(other.to_string())),
    }
}

/// Reject vectors that would violate the storage invariant of exactly `expected`
/// finite components.
pub fn check_embedding(embedding: &[f32], expected: usize) -> Result<(), EmbedError> {
    if embedding.len() != expected {
        return Err(EmbedError::Dimension {
            expected,
            actual: embedding.len(),
        });
    }
    if embedding.iter().any(|x| !x.is_finite()) {
        return Err(EmbedError::NonFinite);
    }
    // Cosine distance is undefined against a zero vector.
    if embedding.iter().all(|x| *x == 0.0) {
        return Err(EmbedError::ZeroNorm);
    }
    Ok(())
}

/// L2-normalize a vector in place. Zero vectors are left untouched.
pub(crate) fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}
