//! Steps of adding a review.
//!
//! [`ReviewService::add_review`](crate::service::ReviewService::add_review) runs
//! [`precheck`] (movie lookup + duplicate check) once on a plain connection,
//! embeds the review text, then opens the unit of work and runs [`precheck`]
//! again, [`insert_review`], and commit. The steps here only borrow a
//! connection; transactions are driven by the caller.

use rusqlite::{params, Connection, OptionalExtension};

use super::catalog::find_movie;
use super::embedding_to_bytes;
use super::types::{CreatedReview, Movie, NewReview};
use crate::embedding::check_embedding;
use crate::error::Result;

/// What the read half of the unit of work found.
#[derive(Debug, Clone, PartialEq)]
pub enum Precheck {
    /// The movie exists and has no review with this text yet.
    Ready(Movie),
    MovieNotFound,
    Duplicate { existing_review_id: i64 },
}

/// Resolve the target movie and look for an identical existing review.
pub fn precheck(conn: &Connection, review: &NewReview) -> Result<Precheck> {
    let Some(movie) = find_movie(conn, &review.movie_id)? else {
        return Ok(Precheck::MovieNotFound);
    };

    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM reviews WHERE movie_id = ?1 AND content = ?2",
            params![review.movie_id, review.content],
            |row| row.get(0),
        )
        .optional()?;

    Ok(match existing {
        Some(existing_review_id) => Precheck::Duplicate { existing_review_id },
        None => Precheck::Ready(movie),
    })
}

/// Insert the review row with its embedding and return the confirmation record.
///
/// `embedding` must have exactly `dimensions` finite components; anything else
/// is a provider error and nothing is written.
pub fn insert_review(
    conn: &Connection,
    review: &NewReview,
    movie: &Movie,
    embedding: &[f32],
    dimensions: usize,
) -> Result<CreatedReview> {
    check_embedding(embedding, dimensions)?;

    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO reviews (movie_id, title, content, rating, embedding, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            movie.external_id,
            review.title.trim(),
            review.content,
            review.rating,
            embedding_to_bytes(embedding),
            now,
        ],
    )?;

    Ok(CreatedReview {
        review_id: conn.last_insert_rowid(),
        movie_id: movie.external_id.clone(),
        movie_title: movie.title.clone(),
        movie_genre: movie.genre.clone(),
        movie_year: movie.release_year,
        movie_rating: movie.rating,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::embedding::{EmbedError, EMBEDDING_DIM};
    use crate::error::ReviewError;
    use crate::reviews::testing::{insert_movie, insert_review as seed_review, spike};

    fn review(movie_id: &str, content: &str) -> NewReview {
        NewReview {
            movie_id: movie_id.into(),
            title: "Great Film".into(),
            content: content.into(),
            rating: 9,
        }
    }

    fn review_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM reviews", [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn precheck_reports_missing_movie() {
        let conn = db::open_memory_database().unwrap();
        let outcome = precheck(&conn, &review("tt9999999", "text")).unwrap();
        assert_eq!(outcome, Precheck::MovieNotFound);
    }

    #[test]
    fn precheck_finds_movie() {
        let conn = db::open_memory_database().unwrap();
        insert_movie(&conn, "tt1234567", "Heat", Some("Crime"), 1995, Some(8.3));
        match precheck(&conn, &review("tt1234567", "text")).unwrap() {
            Precheck::Ready(movie) => {
                assert_eq!(movie.title, "Heat");
                assert_eq!(movie.release_year, 1995);
            }
            other => panic!("expected Ready, got {other:?}"),
        }
    }

    #[test]
    fn precheck_detects_identical_text() {
        let conn = db::open_memory_database().unwrap();
        insert_movie(&conn, "tt1234567", "Heat", None, 1995, None);
        let id = seed_review(&conn, "tt1234567", "Old", "same words", Some(7), Some(&spike(1)));
        let outcome = precheck(&conn, &review("tt1234567", "same words")).unwrap();
        assert_eq!(outcome, Precheck::Duplicate { existing_review_id: id });
    }

    #[test]
    fn insert_writes_full_vector_and_confirms_movie() {
        let conn = db::open_memory_database().unwrap();
        insert_movie(&conn, "tt1234567", "Heat", Some("Crime"), 1995, Some(8.3));
        let movie = find_movie(&conn, "tt1234567").unwrap().unwrap();

        let created = insert_review(
            &conn,
            &review("tt1234567", "unmistakable unique phrase xyz123"),
            &movie,
            &spike(4),
            EMBEDDING_DIM,
        )
        .unwrap();

        assert_eq!(created.movie_title, "Heat");
        assert_eq!(created.movie_genre.as_deref(), Some("Crime"));
        assert_eq!(created.movie_rating, Some(8.3));

        let bytes: i64 = conn
            .query_row(
                "SELECT length(embedding) FROM reviews WHERE id = ?1",
                [created.review_id],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(bytes as usize, EMBEDDING_DIM * 4);
    }

    #[test]
    fn wrong_dimension_is_provider_error_and_writes_nothing() {
        let conn = db::open_memory_database().unwrap();
        insert_movie(&conn, "tt1234567", "Heat", None, 1995, None);
        let movie = find_movie(&conn, "tt1234567").unwrap().unwrap();

        let err = insert_review(&conn, &review("tt1234567", "x"), &movie, &[1.0; 12], EMBEDDING_DIM)
            .unwrap_err();
        assert!(matches!(
            err,
            ReviewError::Provider(EmbedError::Dimension { actual: 12, .. })
        ));
        assert_eq!(review_count(&conn), 0);
    }
}
