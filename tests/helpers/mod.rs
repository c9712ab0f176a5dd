#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use cinesift::config::{LimitsConfig, SearchConfig};
use cinesift::db::Database;
use cinesift::embedding::{EmbedError, EmbeddingProvider, EMBEDDING_DIM};
use cinesift::reviews::embedding_to_bytes;
use cinesift::reviews::types::{Movie, NewReview};
use cinesift::service::ReviewService;
use rusqlite::{params, Connection};
use tempfile::TempDir;

/// Words the keyword provider places on their own axis.
pub const VOCABULARY: [&str; 8] = [
    "heist",
    "undercover",
    "thriller",
    "ocean",
    "submarine",
    "underwater",
    "romance",
    "drama",
];

/// Deterministic provider: one axis per [`VOCABULARY`] word present in the text,
/// plus a small constant component so no text embeds to zero.
pub struct KeywordProvider;

impl EmbeddingProvider for KeywordProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let lower = text.to_lowercase();
        let mut v = vec![0.0f32; EMBEDDING_DIM];
        for (axis, word) in VOCABULARY.iter().enumerate() {
            if lower.contains(word) {
                v[axis] = 1.0;
            }
        }
        v[EMBEDDING_DIM - 1] = 0.1;
        normalize(&mut v);
        Ok(v)
    }

    fn model_name(&self) -> &str {
        "keyword-stub"
    }
}

/// Always fails, like a provider over quota.
pub struct FailingProvider;

impl EmbeddingProvider for FailingProvider {
    fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbedError> {
        Err(EmbedError::Inference("quota exceeded".into()))
    }

    fn model_name(&self) -> &str {
        "failing-stub"
    }
}

/// Answers like [`KeywordProvider`] after blocking for `delay`.
pub struct SlowProvider(pub Duration);

impl EmbeddingProvider for SlowProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        std::thread::sleep(self.0);
        KeywordProvider.embed(text)
    }

    fn model_name(&self) -> &str {
        "slow-stub"
    }
}

/// Create a database file inside `dir`.
pub fn test_database(dir: &TempDir) -> Database {
    Database::open(dir.path().join("reviews.db")).unwrap()
}

pub fn test_service(dir: &TempDir, provider: Arc<dyn EmbeddingProvider>) -> ReviewService {
    ReviewService::new(
        test_database(dir),
        provider,
        SearchConfig::default(),
        LimitsConfig::default(),
    )
}

pub fn movie(id: &str, title: &str, genre: Option<&str>, year: i32) -> Movie {
    Movie {
        external_id: id.into(),
        title: title.into(),
        genre: genre.map(str::to_string),
        release_year: year,
        rating: None,
    }
}

pub fn review(movie_id: &str, content: &str, rating: i64) -> NewReview {
    NewReview {
        movie_id: movie_id.into(),
        title: "Review".into(),
        content: content.into(),
        rating,
    }
}

pub fn seed_movie(conn: &Connection, id: &str, title: &str, genre: Option<&str>, year: i32) {
    conn.execute(
        "INSERT INTO movies (external_id, title, genre, release_year) VALUES (?1, ?2, ?3, ?4)",
        params![id, title, genre, year],
    )
    .unwrap();
}

/// Insert a review with a caller-chosen vector, bypassing the provider.
pub fn seed_review(
    conn: &Connection,
    movie_id: &str,
    content: &str,
    rating: i64,
    embedding: Option<&[f32]>,
) -> i64 {
    conn.execute(
        "INSERT INTO reviews (movie_id, title, content, rating, embedding, created_at) \
         VALUES (?1, 'Seeded', ?2, ?3, ?4, '2024-01-01T00:00:00Z')",
        params![movie_id, content, rating, embedding.map(embedding_to_bytes)],
    )
    .unwrap();
    conn.last_insert_rowid()
}

pub fn review_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM reviews", [], |r| r.get(0))
        .unwrap()
}

/// Unit vector along `dim`.
pub fn spike(dim: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; EMBEDDING_DIM];
    v[dim] = 1.0;
    v
}

/// Unit vector whose cosine similarity to `spike(a)` is `w`.
pub fn blend(a: usize, b: usize, w: f32) -> Vec<f32> {
    let mut v = vec![0.0f32; EMBEDDING_DIM];
    v[a] = w;
    v[b] = (1.0 - w * w).sqrt();
    v
}

fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    v.iter_mut().for_each(|x| *x /= norm);
}
