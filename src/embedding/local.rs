//! Local ONNX Runtime embedding provider.
//!
//! Implements [`EmbeddingProvider`] using the all-MiniLM-L6-v2 model via `ort`:
//! tokenize, run the encoder, mean-pool token states under the attention mask,
//! then L2-normalize.

use std::fmt::Display;
use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Encoding, Tokenizer};

use super::{l2_normalize, EmbedError, EmbeddingProvider, EMBEDDING_DIM};
use crate::config::EmbeddingConfig;

/// Maximum sequence length for all-MiniLM-L6-v2 (trained at 256).
const MAX_SEQ_LEN: usize = 256;

pub const MODEL_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

pub struct LocalEmbeddingProvider {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    model: String,
}

// Safety: Tokenizer is Send+Sync. Session is only reached through the Mutex.
unsafe impl Send for LocalEmbeddingProvider {}
unsafe impl Sync for LocalEmbeddingProvider {}

fn load_err(e: impl Display) -> EmbedError {
    EmbedError::ModelLoad(e.to_string())
}

fn infer_err(e: impl Display) -> EmbedError {
    EmbedError::Inference(e.to_string())
}

impl LocalEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbedError> {
        let cache_dir = crate::config::expand_tilde(&config.cache_dir);
        let model_path = cache_dir.join(MODEL_FILE);
        let tokenizer_path = cache_dir.join(TOKENIZER_FILE);

        for path in [&model_path, &tokenizer_path] {
            if !path.exists() {
                return Err(EmbedError::ModelLoad(format!(
                    "{} not found. Run `cinesift model download` first.",
                    path.display()
                )));
            }
        }

        let session = Session::builder()
            .map_err(load_err)?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
            .map_err(load_err)?
            .with_intra_threads(4)
            .map_err(load_err)?
            .commit_from_file(&model_path)
            .map_err(load_err)?;
        tracing::info!(model = %model_path.display(), "ONNX model loaded");

        let tokenizer = load_tokenizer(&tokenizer_path)?;
        tracing::info!(tokenizer = %tokenizer_path.display(), "tokenizer loaded");

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            model: config.model.clone(),
        })
    }
}

fn load_tokenizer(path: &Path) -> Result<Tokenizer, EmbedError> {
    let mut tokenizer = Tokenizer::from_file(path).map_err(load_err)?;
    tokenizer
        .with_truncation(Some(tokenizers::TruncationParams {
            max_length: MAX_SEQ_LEN,
            ..Default::default()
        }))
        .map_err(load_err)?;
    tokenizer.with_padding(Some(tokenizers::PaddingParams {
        strategy: tokenizers::PaddingStrategy::BatchLongest,
        ..Default::default()
    }));
    Ok(tokenizer)
}

impl EmbeddingProvider for LocalEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| EmbedError::Inference("model returned no embedding".into()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbedError::Tokenizer(e.to_string()))?;

        let batch_size = encodings.len();
        let seq_len = encodings[0].get_ids().len();
        let (input_ids, attention_mask) = flatten_encodings(&encodings);

        let shape = vec![batch_size as i64, seq_len as i64];
        let input_ids = Tensor::from_array((shape.clone(), input_ids.into_boxed_slice()))
            .map_err(infer_err)?;
        let mask_tensor =
            Tensor::from_array((shape.clone(), attention_mask.clone().into_boxed_slice()))
                .map_err(infer_err)?;
        // Single-segment input: token_type_ids are all zero.
        let token_type_ids =
            Tensor::from_array((shape, vec![0i64; batch_size * seq_len].into_boxed_slice()))
                .map_err(infer_err)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| EmbedError::Inference(format!("session lock poisoned: {e}")))?;

        let outputs = session
            .run(ort::inputs! {
                "input_ids" => input_ids,
                "attention_mask" => mask_tensor,
                "token_type_ids" => token_type_ids,
            })
            .map_err(infer_err)?;

        // Output name varies by ONNX export.
        let hidden = outputs
            .get("token_embeddings")
            .or_else(|| outputs.get("last_hidden_state"))
            .unwrap_or_else(|| &outputs[0]);

        let (dims, data) = hidden.try_extract_tensor::<f32>().map_err(infer_err)?;
        let dims: &[i64] = &dims;
        if dims.len() != 3 || dims[2] != EMBEDDING_DIM as i64 {
            return Err(EmbedError::Inference(format!(
                "unexpected hidden state shape {dims:?}, expected [batch, seq, {EMBEDDING_DIM}]"
            )));
        }

        let pooled = mean_pool(data, &attention_mask, batch_size, seq_len, dims[1] as usize);
        Ok(pooled
            .into_iter()
            .map(|mut v| {
                l2_normalize(&mut v);
                v
            })
            .collect())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Flatten per-text encodings into row-major `i64` id and mask buffers.
fn flatten_encodings(encodings: &[Encoding]) -> (Vec<i64>, Vec<i64>) {
    let ids = encodings
        .iter()
        .flat_map(|e| e.get_ids().iter().map(|&id| i64::from(id)))
        .collect();
    let mask = encodings
        .iter()
        .flat_map(|e| e.get_attention_mask().iter().map(|&m| i64::from(m)))
        .collect();
    (ids, mask)
}

/// Average token states whose attention mask is set. `hidden` is
/// `[batch, hidden_seq_len, EMBEDDING_DIM]`; `mask` is `[batch, seq_len]`.
fn mean_pool(
    hidden: &[f32],
    mask: &[i64],
    batch_size: usize,
    seq_len: usize,
    hidden_seq_len: usize,
) -> Vec<Vec<f32>> {
    (0..batch_size)
        .map(|b| {
            let mut sum = vec![0.0f32; EMBEDDING_DIM];
            let mut count = 0.0f32;
            for s in 0..hidden_seq_len.min(seq_len) {
                if mask[b * seq_len + s] == 0 {
                    continue;
                }
                let offset = (b * hidden_seq_len + s) * EMBEDDING_DIM;
                for (acc, x) in sum.iter_mut().zip(&hidden[offset..offset + EMBEDDING_DIM]) {
                    *acc += x;
                }
                count += 1.0;
            }
            if count > 0.0 {
                sum.iter_mut().for_each(|x| *x /= count);
            }
            sum
        })
        .collect()
}
