//! Read access to the movie catalog, plus the bulk import used to populate it.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::filter::CatalogFilter;
use super::search::validate_limit;
use super::types::{CatalogRow, ImportSummary, Movie};
use crate::error::{Result, ReviewError};

const CATALOG_COLUMNS: &str = "m.external_id, m.title, m.genre, m.release_year, m.rating, \
     (SELECT COUNT(*) FROM reviews r WHERE r.movie_id = m.external_id)";

/// Look up a movie by catalog id.
pub fn find_movie(conn: &Connection, external_id: &str) -> rusqlite::Result<Option<Movie>> {
    conn.query_row(
        "SELECT external_id, title, genre, release_year, rating FROM movies WHERE external_id = ?1",
        params![external_id],
        |row| {
            Ok(Movie {
                external_id: row.get(0)?,
                title: row.get(1)?,
                genre: row.get(2)?,
                release_year: row.get(3)?,
                rating: row.get(4)?,
            })
        },
    )
    .optional()
}

/// A single catalog row (with review count), or `None` if the id is unknown.
pub fn get_movie(conn: &Connection, external_id: &str) -> Result<Option<CatalogRow>> {
    let sql = format!("SELECT {CATALOG_COLUMNS} FROM movies m WHERE m.external_id = ?1");
    Ok(conn
        .query_row(&sql, params![external_id], catalog_row)
        .optional()?)
}

/// Movies matching `filter`, newest first, then by title.
pub fn browse_movies(conn: &Connection, filter: &CatalogFilter, limit: usize) -> Result<Vec<CatalogRow>> {
    validate_limit(limit)?;

    let clause = filter.predicates().render(1);
    let limit_param = clause.values.len() + 1;
    let sql = format!(
        "SELECT {CATALOG_COLUMNS} FROM movies m WHERE {} \
         ORDER BY m.release_year DESC, m.title ASC LIMIT ?{limit_param}",
        clause.sql
    );

    let mut values = clause.values;
    values.push(Value::Integer(limit as i64));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(values), catalog_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Insert or update catalog entries in one transaction. Any invalid row aborts
/// the whole import.
pub fn import_movies(conn: &mut Connection, movies: &[Movie]) -> Result<ImportSummary> {
    for movie in movies {
        if movie.external_id.trim().is_empty() || movie.title.trim().is_empty() {
            return Err(ReviewError::validation(format!(
                "movie entries need an id and a title (got id {:?})",
                movie.external_id
            )));
        }
    }

    let tx = conn.transaction()?;
    let mut summary = ImportSummary::default();
    {
        let mut exists = tx.prepare("SELECT 1 FROM movies WHERE external_id = ?1")?;
        let mut upsert = tx.prepare(
            "INSERT INTO movies (external_id, title, genre, release_year, rating) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT(external_id) DO UPDATE SET \
                 title = excluded.title, genre = excluded.genre, \
                 release_year = excluded.release_year, rating = excluded.rating",
        )?;

        for movie in movies {
            let external_id = movie.external_id.trim();
            if exists.exists(params![external_id])? {
                summary.updated += 1;
            } else {
                summary.inserted += 1;
            }
            upsert.execute(params![
                external_id,
                movie.title.trim(),
                movie.genre,
                movie.release_year,
                movie.rating,
            ])?;
        }
    }
    tx.commit()?;

    tracing::info!(
        inserted = summary.inserted,
        updated = summary.updated,
        "catalog import committed"
    );
    Ok(summary)
}

fn catalog_row(row: &Row<'_>) -> rusqlite::Result<CatalogRow> {
    Ok(CatalogRow {
        external_id: row.get(0)?,
        title: row.get(1)?,
        genre: row.get(2)?,
        release_year: row.get(3)?,
        rating: row.get(4)?,
        review_count: row.get::<_, i64>(5)? as u64,
    })
}
