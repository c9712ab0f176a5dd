use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::Result;

/// Corpus counts for `cinesift stats`.
#[derive(Debug, Serialize)]
pub struct CorpusStats {
    pub total_movies: u64,
    pub total_reviews: u64,
    pub embedded_reviews: u64,
    pub unembedded_reviews: u64,
    /// Review count per movie genre string; movies without a genre are under `"(none)"`.
    pub reviews_by_genre: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_review: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_review: Option<String>,
}

pub fn corpus_stats(conn: &Connection) -> Result<CorpusStats> {
    let count = |sql: &str| -> rusqlite::Result<u64> {
        conn.query_row(sql, [], |row| row.get::<_, i64>(0)).map(|n| n as u64)
    };

    let total_movies = count("SELECT COUNT(*) FROM movies")?;
    let total_reviews = count("SELECT COUNT(*) FROM reviews")?;
    let embedded_reviews = count("SELECT COUNT(*) FROM reviews WHERE embedding IS NOT NULL")?;

    let mut stmt = conn.prepare(
        "SELECT COALESCE(m.genre, '(none)'), COUNT(*) FROM reviews r \
         JOIN movies m ON m.external_id = r.movie_id GROUP BY 1",
    )?;
    let reviews_by_genre = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64)))?
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    let (oldest_review, newest_review) = conn.query_row(
        "SELECT MIN(created_at), MAX(created_at) FROM reviews",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(CorpusStats {
        total_movies,
        total_reviews,
        embedded_reviews,
        unembedded_reviews: total_reviews - embedded_reviews,
        reviews_by_genre,
        oldest_review,
        newest_review,
    })
}
