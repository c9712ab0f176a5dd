//! SQL DDL for all cinesift tables.
//!
//! Defines `movies` (catalog, read-only to the core), `reviews` (with an optional
//! float32 embedding blob), and `schema_meta`. All DDL uses `IF NOT EXISTS` for
//! idempotent initialization.

use rusqlite::Connection;

use crate::embedding::EMBEDDING_DIM;

/// Catalog, review, and metadata tables. `{embedding_bytes}` is substituted with
/// the byte length of one stored vector so a partial vector can never be written.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS movies (
    external_id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    genre TEXT,
    release_year INTEGER NOT NULL,
    rating REAL
);

CREATE INDEX IF NOT EXISTS idx_movies_year ON movies(release_year);

CREATE TABLE IF NOT EXISTS reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    movie_id TEXT NOT NULL REFERENCES movies(external_id),
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    rating INTEGER CHECK(rating IS NULL OR (rating >= 1 AND rating <= 10)),
    embedding BLOB CHECK(embedding IS NULL OR length(embedding) = {embedding_bytes}),
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reviews_movie ON reviews(movie_id);

CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Byte length of one stored embedding (`FLOAT32` per component).
pub const EMBEDDING_BYTES: usize = EMBEDDING_DIM * std::mem::size_of::<f32>();

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(&SCHEMA_SQL.replace("{embedding_bytes}", &EMBEDDING_BYTES.to_string()))?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
