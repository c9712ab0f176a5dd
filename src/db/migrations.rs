//! Forward-only schema migration framework.
//!
//! Tracks the schema version in `schema_meta` and runs sequential migrations
//! to bring the database up to [`CURRENT_SCHEMA_VERSION`].

use rusqlite::{Connection, OptionalExtension};

/// The schema version that the current binary expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Get the current schema version from the database.
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'schema_version'",
        [],
        |row| {
            let val: String = row.get(0)?;
            Ok(val.parse::<u32>().unwrap_or(0))
        },
    )
}

fn update_schema_version(conn: &Connection, version: u32) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE schema_meta SET value = ?1 WHERE key = 'schema_version'",
        [version.to_string()],
    )?;
    Ok(())
}

/// Get the stored embedding model identifier, if any.
pub fn get_embedding_model(conn: &Connection) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'embedding_model'",
        [],
        |row| row.get::<_, String>(0),
    )
    .optional()
}

/// Set the stored embedding model identifier.
pub fn set_embedding_model(conn: &Connection, model: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_meta (key, value) VALUES ('embedding_model', ?1)",
        [model],
    )?;
    Ok(())
}

/// Record `model` as the embedding model on first use.
///
/// Returns the previously stored model when it differs from `model`; stored
/// vectors from another model are not comparable with new query vectors.
pub fn ensure_embedding_model(conn: &Connection, model: &str) -> rusqlite::Result<Option<String>> {
    match get_embedding_model(conn)? {
        Some(stored) if stored != model => Ok(Some(stored)),
        Some(_) => Ok(None),
        None => {
            set_embedding_model(conn, model)?;
            Ok(None)
        }
    }
}

/// Run any pending forward-only migrations. Each migration runs in a transaction.
pub fn run_migrations(conn: &mut Connection) -> rusqlite::Result<()> {
    let mut version = get_schema_version(conn)?;
    tracing::debug!(schema_version = version, target = CURRENT_SCHEMA_VERSION, "checking migrations");

    while version < CURRENT_SCHEMA_VERSION {
        let next = version + 1;
        tracing::info!(from = version, to = next, "running migration");

        let tx = conn.transaction()?;
        match next {
            2 => migrate_v1_to_v2(&tx)?,
            _ => {
                tracing::error!(version = next, "unknown migration target");
                break;
            }
        }
        update_schema_version(&tx, next)?;
        tx.commit()?;
        version = next;
    }

    Ok(())
}

/// Migration v1 → v2: at most one review per movie with identical text.
/// Existing duplicates are collapsed onto the oldest row first.
fn migrate_v1_to_v2(conn: &Connection) -> rusqlite::Result<()> {
    let removed = conn.execute(
        "DELETE FROM reviews WHERE id NOT IN \
         (SELECT MIN(id) FROM reviews GROUP BY movie_id, content)",
        [],
    )?;
    if removed > 0 {
        tracing::warn!(removed, "dropped duplicate reviews before adding unique index");
    }
    conn.execute_batch(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_reviews_movie_content ON reviews(movie_id, content);",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        crate::db::schema::init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn get_schema_version_returns_1_on_fresh_db() {
        let conn = test_db();
        assert_eq!(get_schema_version(&conn).unwrap(), 1);
    }

    #[test]
    fn run_migrations_upgrades_to_current() {
        let mut conn = test_db();
        run_migrations(&mut conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn migration_v1_to_v2_adds_duplicate_guard() {
        let mut conn = test_db();
        run_migrations(&mut conn).unwrap();

        let index: Option<String> = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'index' AND name = 'idx_reviews_movie_content'",
                [],
                |row| row.get(0),
            )
            .optional()
            .unwrap();
        assert!(index.is_some());
    }

    #[test]
    fn migration_v1_to_v2_collapses_existing_duplicates() {
        let mut conn = test_db();
        conn.execute_batch(
            "INSERT INTO movies (external_id, title, release_year) VALUES ('tt1', 'Heat', 1995);
             INSERT INTO reviews (movie_id, title, content, created_at) VALUES ('tt1', 'a', 'same', 'now');
             INSERT INTO reviews (movie_id, title, content, created_at) VALUES ('tt1', 'b', 'same', 'now');
             INSERT INTO reviews (movie_id, title, content, created_at) VALUES ('tt1', 'c', 'other', 'now');",
        )
        .unwrap();

        run_migrations(&mut conn).unwrap();

        let titles: Vec<String> = conn
            .prepare("SELECT title FROM reviews ORDER BY id")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(titles, vec!["a", "c"]);
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn migrations_are_idempotent() {
        let mut conn = test_db();
        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn ensure_embedding_model_records_then_detects_change() {
        let conn = test_db();
        assert_eq!(get_embedding_model(&conn).unwrap(), None);

        assert_eq!(ensure_embedding_model(&conn, "all-MiniLM-L6-v2").unwrap(), None);
        assert_eq!(
            get_embedding_model(&conn).unwrap().as_deref(),
            Some("all-MiniLM-L6-v2")
        );
        assert_eq!(ensure_embedding_model(&conn, "all-MiniLM-L6-v2").unwrap(), None);

        let stored = ensure_embedding_model(&conn, "hashed-fnv1a").unwrap();
        assert_eq!(stored.as_deref(), Some("all-MiniLM-L6-v2"));
    }
}
