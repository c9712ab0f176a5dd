//! Deterministic feature-hashing embedder.
//!
//! Each lowercase word and adjacent word pair is hashed (FNV-1a) onto a signed
//! bucket, and the result is L2-normalized. Texts sharing vocabulary land close
//! together; there is no model and no semantic generalization beyond shared words.

use super::{l2_normalize, EmbedError, EmbeddingProvider};

/// Identifier recorded in `schema_meta` for vectors from this provider.
pub const MODEL_NAME: &str = "hashed-fnv1a";

pub struct HashedEmbeddingProvider {
    dimensions: usize,
}

impl HashedEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn add_feature(&self, embedding: &mut [f32], feature: &str, weight: f32) {
        let hash = fnv1a_hash(feature.as_bytes());
        let bucket = (hash % self.dimensions as u64) as usize;
        // High bit picks the sign so collisions tend to cancel rather than pile up.
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        embedding[bucket] += sign * weight;
    }
}

impl EmbeddingProvider for HashedEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| !s.is_empty())
            .collect();

        if tokens.is_empty() {
            return Err(EmbedError::EmptyInput);
        }

        let mut embedding = vec![0.0f32; self.dimensions];
        for token in &tokens {
            self.add_feature(&mut embedding, token, 1.0);
        }
        for pair in tokens.windows(2) {
            self.add_feature(&mut embedding, &format!("{}_{}", pair[0], pair[1]), 0.5);
        }

        l2_normalize(&mut embedding);
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }
}

fn fnv1a_hash(data: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    data.iter().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}
