use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};

use super::embedding_to_bytes;
use super::filter::{keyword_predicates, PredicateSet, ReviewFilter};
use super::types::{LexicalMatch, RankedReview, SearchOutcome};
use crate::error::{Result, ReviewError};

/// Upper bound on any result limit.
pub const MAX_LIMIT: usize = 100;

// ── Validation ────────────────────────────────────────────────────────────────

pub fn validate_query(query: &str) -> Result<()> {
    if query.trim().is_empty() {
        return Err(ReviewError::validation("query text must not be empty"));
    }
    Ok(())
}

pub fn validate_limit(limit: usize) -> Result<()> {
    if limit == 0 || limit > MAX_LIMIT {
        return Err(ReviewError::validation(format!(
            "limit must be between 1 and {MAX_LIMIT}, got {limit}"
        )));
    }
    Ok(())
}

pub fn validate_min_similarity(min_similarity: f64) -> Result<()> {
    if !min_similarity.is_finite() || !(-1.0..=1.0).contains(&min_similarity) {
        return Err(ReviewError::validation(format!(
            "minimum similarity must be within [-1, 1], got {min_similarity}"
        )));
    }
    Ok(())
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Rank every embedded review by cosine similarity to `query_embedding`,
/// keeping rows with similarity ≥ `min_similarity`.
pub fn search_reviews(
    conn: &Connection,
    query_embedding: &[f32],
    limit: usize,
    min_similarity: f64,
) -> Result<SearchOutcome> {
    validate_limit(limit)?;
    validate_min_similarity(min_similarity)?;

    let rows = ranked_query(
        conn,
        query_embedding,
        &PredicateSet::embedded_reviews(),
        Some(min_similarity),
        limit,
    )?;
    tracing::debug!(returned = rows.len(), min_similarity, "ranked search");
    Ok(SearchOutcome::from_rows(rows))
}

/// Rank embedded reviews that satisfy `filter`.
///
/// No similarity cutoff is applied unless `min_similarity` is given, in which
/// case it behaves exactly as in [`search_reviews`].
pub fn search_reviews_filtered(
    conn: &Connection,
    query_embedding: &[f32],
    filter: &ReviewFilter,
    limit: usize,
    min_similarity: Option<f64>,
) -> Result<SearchOutcome> {
    validate_limit(limit)?;
    if let Some(threshold) = min_similarity {
        validate_min_similarity(threshold)?;
    }

    let predicates = filter.predicates();
    let rows = ranked_query(conn, query_embedding, &predicates, min_similarity, limit)?;
    tracing::debug!(
        returned = rows.len(),
        predicates = predicates.len(),
        "filtered ranked search"
    );
    Ok(SearchOutcome::from_rows(rows))
}

/// Reviews whose text contains every whitespace token of `keywords`
/// (case-insensitive substring match). Unranked; oldest review first.
pub fn lexical_search(conn: &Connection, keywords: &[String], limit: usize) -> Result<Vec<LexicalMatch>> {
    validate_limit(limit)?;
    let predicates = keyword_predicates(keywords);
    if predicates.is_empty() {
        return Err(ReviewError::validation("at least one keyword is required"));
    }

    let clause = predicates.render(1);
    let limit_param = clause.values.len() + 1;
    let sql = format!(
        "SELECT r.id, r.movie_id, m.title, r.title, r.rating, m.genre, m.release_year \
         FROM reviews r JOIN movies m ON m.external_id = r.movie_id \
         WHERE {} ORDER BY r.id LIMIT ?{limit_param}",
        clause.sql
    );

    let mut values = clause.values;
    values.push(Value::Integer(limit as i64));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(values), |row| {
            Ok(LexicalMatch {
                review_id: row.get(0)?,
                movie_id: row.get(1)?,
                movie_title: row.get(2)?,
                review_title: row.get(3)?,
                review_rating: row.get(4)?,
                genre: row.get(5)?,
                release_year: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Brute-force cosine scan over the rows admitted by `predicates`.
///
/// Placeholders: `?1` is the query vector, predicate values follow, then the
/// optional similarity floor, then the limit.
fn ranked_query(
    conn: &Connection,
    query_embedding: &[f32],
    predicates: &PredicateSet,
    min_similarity: Option<f64>,
    limit: usize,
) -> Result<Vec<RankedReview>> {
    let clause = predicates.render(2);
    let mut values = Vec::with_capacity(clause.values.len() + 3);
    values.push(Value::Blob(embedding_to_bytes(query_embedding)));
    values.extend(clause.values);

    let mut outer_where = String::from("distance IS NOT NULL");
    if let Some(threshold) = min_similarity {
        values.push(Value::Real(threshold));
        outer_where.push_str(&format!(" AND 1.0 - distance >= ?{}", values.len()));
    }
    values.push(Value::Integer(limit as i64));
    let limit_param = values.len();

    let sql = format!(
        "SELECT id, movie_id, movie_title, review_title, rating, genre, release_year, distance FROM ( \
             SELECT r.id AS id, r.movie_id AS movie_id, m.title AS movie_title, \
                    r.title AS review_title, r.rating AS rating, m.genre AS genre, \
                    m.release_year AS release_year, \
                    vec_distance_cosine(r.embedding, ?1) AS distance \
             FROM reviews r JOIN movies m ON m.external_id = r.movie_id \
             WHERE {} \
         ) WHERE {outer_where} \
         ORDER BY distance ASC, id ASC \
         LIMIT ?{limit_param}",
        clause.sql
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(values), ranked_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn ranked_row(row: &Row<'_>) -> rusqlite::Result<RankedReview> {
    let distance: f64 = row.get(7)?;
    Ok(RankedReview {
        review_id: row.get(0)?,
        movie_id: row.get(1)?,
        movie_title: row.get(2)?,
        review_title: row.get(3)?,
        review_rating: row.get(4)?,
        genre: row.get(5)?,
        release_year: row.get(6)?,
        similarity: round4(1.0 - distance),
    })
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::embedding::EMBEDDING_DIM;
    use crate::reviews::testing::{insert_movie, insert_review, spike, blend};

    fn seeded() -> Connection {
        let conn = db::open_memory_database().unwrap();
        insert_movie(&conn, "tt0113277", "Heat", Some("Crime"), 1995, Some(8.3));
        insert_movie(&conn, "tt0407887", "The Departed", Some("Crime, Drama"), 2006, Some(8.5));
        insert_movie(&conn, "tt0112130", "Sense and Sensibility", Some("Romance"), 1995, None);
        conn
    }

    #[test]
    fn nearest_review_ranks_first() {
        let conn = seeded();
        let near = insert_review(&conn, "tt0113277", "Tense", "heist", Some(9), Some(&spike(0)));
        insert_review(&conn, "tt0112130", "Sweet", "period", Some(7), Some(&spike(200)));

        let outcome = search_reviews(&conn, &spike(0), 5, 0.5).unwrap();
        let rows = outcome.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].review_id, near);
        assert_eq!(rows[0].movie_title, "Heat");
        assert!((rows[0].similarity - 1.0).abs() < 1e-4);
    }

    #[test]
    fn threshold_excludes_low_similarity() {
        let conn = seeded();
        insert_review(&conn, "tt0113277", "A", "a", Some(8), Some(&blend(0, 1, 0.9)));
        insert_review(&conn, "tt0407887", "B", "b", Some(8), Some(&blend(0, 1, 0.5)));
        insert_review(&conn, "tt0112130", "C", "c", Some(8), Some(&spike(1)));

        let outcome = search_reviews(&conn, &spike(0), 10, 0.75).unwrap();
        let rows = outcome.rows();
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|r| r.similarity >= 0.75));
        assert!(rows.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    }

    #[test]
    fn nothing_above_threshold_is_no_matches() {
        let conn = seeded();
        insert_review(&conn, "tt0113277", "A", "a", Some(8), Some(&spike(10)));
        let outcome = search_reviews(&conn, &spike(0), 5, 0.75).unwrap();
        assert_eq!(outcome, SearchOutcome::NoMatches);
    }

    #[test]
    fn reviews_without_embedding_are_never_ranked() {
        let conn = seeded();
        insert_review(&conn, "tt0113277", "Imported", "no vector", Some(8), None);
        let outcome =
            search_reviews_filtered(&conn, &spike(0), &ReviewFilter::default(), 5, None).unwrap();
        assert_eq!(outcome, SearchOutcome::NoMatches);
    }

    #[test]
    fn limit_truncates_in_rank_order() {
        let conn = seeded();
        for (i, w) in [0.95f32, 0.8, 0.9, 0.6].iter().enumerate() {
            insert_review(&conn, "tt0113277", &format!("r{i}"), &format!("text {i}"), Some(7), Some(&blend(0, 1, *w)));
        }
        let rows = search_reviews(&conn, &spike(0), 2, -1.0).unwrap().into_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].review_title, "r0");
        assert_eq!(rows[1].review_title, "r2");
    }

    #[test]
    fn filtered_search_applies_every_constraint() {
        let conn = seeded();
        insert_review(&conn, "tt0113277", "Heat low", "x1", Some(5), Some(&blend(0, 1, 0.9)));
        insert_review(&conn, "tt0113277", "Heat high", "x2", Some(9), Some(&blend(0, 1, 0.8)));
        insert_review(&conn, "tt0407887", "Departed", "x3", Some(9), Some(&blend(0, 1, 0.7)));
        insert_review(&conn, "tt0112130", "Romance", "x4", Some(10), Some(&spike(0)));

        let filter = ReviewFilter {
            min_year: Some(1990),
            max_year: Some(2000),
            genre: Some("crime".into()),
            min_rating: Some(8),
        };
        let rows = search_reviews_filtered(&conn, &spike(0), &filter, 10, None)
            .unwrap()
            .into_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].review_title, "Heat high");
    }

    #[test]
    fn filtered_search_has_no_cutoff_by_default() {
        let conn = seeded();
        insert_review(&conn, "tt0113277", "Far", "far", Some(8), Some(&spike(300)));
        let rows = search_reviews_filtered(&conn, &spike(0), &ReviewFilter::default(), 5, None)
            .unwrap()
            .into_rows();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].similarity.abs() < 1e-4);

        let cut = search_reviews_filtered(&conn, &spike(0), &ReviewFilter::default(), 5, Some(0.5))
            .unwrap();
        assert_eq!(cut, SearchOutcome::NoMatches);
    }

    #[test]
    fn adding_a_filter_never_grows_results() {
        let conn = seeded();
        for (movie, rating) in [("tt0113277", 6), ("tt0407887", 9), ("tt0112130", 8)] {
            insert_review(&conn, movie, "t", &format!("{movie} {rating}"), Some(rating), Some(&blend(0, 2, 0.7)));
        }
        let base = ReviewFilter { genre: Some("crime".into()), ..Default::default() };
        let narrower = ReviewFilter { min_rating: Some(8), ..base.clone() };

        let wide = search_reviews_filtered(&conn, &spike(0), &base, 10, None).unwrap().into_rows();
        let narrow = search_reviews_filtered(&conn, &spike(0), &narrower, 10, None).unwrap().into_rows();
        assert!(narrow.len() <= wide.len());
        assert!(narrow.iter().all(|n| wide.iter().any(|w| w.review_id == n.review_id)));
    }

    #[test]
    fn lexical_requires_every_token() {
        let conn = seeded();
        let both = insert_review(&conn, "tt0113277", "Both", "The OCEAN swallowed the submarine", Some(7), None);
        insert_review(&conn, "tt0407887", "One", "just the ocean", Some(7), None);

        let rows = lexical_search(&conn, &["ocean submarine".to_string()], 5).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].review_id, both);
    }

    #[test]
    fn lexical_rejects_empty_keywords() {
        let conn = seeded();
        let err = lexical_search(&conn, &["   ".to_string()], 5).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn invalid_limits_and_thresholds_are_rejected() {
        let conn = seeded();
        assert!(search_reviews(&conn, &spike(0), 0, 0.5).is_err());
        assert!(search_reviews(&conn, &spike(0), MAX_LIMIT + 1, 0.5).is_err());
        assert!(search_reviews(&conn, &spike(0), 5, 1.5).is_err());
        assert!(search_reviews(&conn, &spike(0), 5, f64::NAN).is_err());
        assert!(validate_query("  ").is_err());
    }

    #[test]
    fn similarity_is_rounded_to_four_places() {
        assert_eq!(round4(0.123_456), 0.1235);
        assert_eq!(round4(1.0 - 0.000_04), 1.0);
        assert_eq!(spike(3).len(), EMBEDDING_DIM);
    }
}
