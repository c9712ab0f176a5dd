mod helpers;

use std::sync::Arc;

use cinesift::reviews::filter::ReviewFilter;
use cinesift::reviews::search::{search_reviews, search_reviews_filtered};
use cinesift::reviews::types::SearchOutcome;
use helpers::*;
use rusqlite::Connection;
use tempfile::TempDir;

/// Six reviews at known similarities to `spike(0)`, plus one without a vector.
fn seeded(dir: &TempDir) -> Connection {
    let conn = test_database(dir).connect().unwrap();
    seed_movie(&conn, "tt1", "Heat", Some("Crime, Drama"), 1995);
    seed_movie(&conn, "tt2", "Inside Man", Some("Crime, Thriller"), 2006);
    seed_movie(&conn, "tt3", "Drive", Some("Drama"), 2011);

    seed_review(&conn, "tt1", "r95", 9, Some(&blend(0, 1, 0.95)));
    seed_review(&conn, "tt2", "r90", 7, Some(&blend(0, 2, 0.90)));
    seed_review(&conn, "tt3", "r80", 8, Some(&blend(0, 3, 0.80)));
    seed_review(&conn, "tt1", "r77", 4, Some(&blend(0, 4, 0.77)));
    seed_review(&conn, "tt2", "r60", 10, Some(&blend(0, 5, 0.60)));
    seed_review(&conn, "tt3", "r20", 6, Some(&blend(0, 6, 0.20)));
    seed_review(&conn, "tt3", "no vector", 9, None);
    conn
}

#[test]
fn similarity_is_non_increasing() {
    let dir = TempDir::new().unwrap();
    let conn = seeded(&dir);

    let rows = search_reviews(&conn, &spike(0), 10, -1.0).unwrap().into_rows();
    assert_eq!(rows.len(), 6, "reviews without a vector never rank");
    assert!(rows.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    assert!((rows[0].similarity - 0.95).abs() < 1e-3);
}

#[test]
fn threshold_excludes_everything_below_it() {
    let dir = TempDir::new().unwrap();
    let conn = seeded(&dir);

    let rows = search_reviews(&conn, &spike(0), 5, 0.75).unwrap().into_rows();
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|r| r.similarity >= 0.75));
}

#[test]
fn limit_truncates_after_ordering() {
    let dir = TempDir::new().unwrap();
    let conn = seeded(&dir);

    let rows = search_reviews(&conn, &spike(0), 2, 0.0).unwrap().into_rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].movie_title, "Heat");
    assert_eq!(rows[1].movie_title, "Inside Man");
}

#[test]
fn nothing_above_threshold_is_no_matches() {
    let dir = TempDir::new().unwrap();
    let conn = seeded(&dir);

    let outcome = search_reviews(&conn, &spike(7), 5, 0.5).unwrap();
    assert_eq!(outcome, SearchOutcome::NoMatches);
}

#[test]
fn adding_a_filter_never_grows_the_result() {
    let dir = TempDir::new().unwrap();
    let conn = seeded(&dir);
    let query = spike(0);

    let filters = [
        ReviewFilter::default(),
        ReviewFilter {
            genre: Some("drama".into()),
            ..Default::default()
        },
        ReviewFilter {
            genre: Some("drama".into()),
            min_year: Some(2000),
            ..Default::default()
        },
        ReviewFilter {
            genre: Some("drama".into()),
            min_year: Some(2000),
            min_rating: Some(7),
            ..Default::default()
        },
        ReviewFilter {
            genre: Some("drama".into()),
            min_year: Some(2000),
            min_rating: Some(7),
            max_year: Some(2010),
        },
    ];

    let sizes: Vec<usize> = filters
        .iter()
        .map(|f| {
            search_reviews_filtered(&conn, &query, f, 100, None)
                .unwrap()
                .rows()
                .len()
        })
        .collect();
    assert_eq!(sizes, vec![6, 4, 2, 1, 0]);
    assert!(sizes.windows(2).all(|w| w[1] <= w[0]));
}

#[test]
fn filtered_search_has_no_floor_unless_asked() {
    let dir = TempDir::new().unwrap();
    let conn = seeded(&dir);
    let filter = ReviewFilter {
        genre: Some("Drama".into()),
        min_year: Some(2010),
        ..Default::default()
    };

    let open = search_reviews_filtered(&conn, &spike(0), &filter, 10, None)
        .unwrap()
        .into_rows();
    assert_eq!(open.len(), 2);
    assert!(open.iter().any(|r| r.similarity < 0.5));

    let floored = search_reviews_filtered(&conn, &spike(0), &filter, 10, Some(0.75))
        .unwrap()
        .into_rows();
    assert_eq!(floored.len(), 1);
    assert!(floored[0].similarity >= 0.75);
}

#[tokio::test]
async fn undercover_heist_query_ranks_above_threshold() {
    let dir = TempDir::new().unwrap();
    let service = test_service(&dir, Arc::new(KeywordProvider));
    service
        .import_movies(vec![
            movie("tt1", "Heat", Some("Crime"), 1995),
            movie("tt2", "The Departed", Some("Crime, Thriller"), 2006),
        ])
        .await
        .unwrap();
    for (id, text) in [
        ("tt1", "an undercover heist thriller done right"),
        ("tt2", "undercover cops, tense thriller"),
        ("tt2", "a heist comedy with romance"),
        ("tt1", "slow ocean drama"),
    ] {
        service.add_review(review(id, text, 8)).await.unwrap();
    }

    let outcome = service
        .search_reviews("a tense undercover heist thriller", Some(5), Some(0.75))
        .await
        .unwrap();
    let rows = outcome.rows();
    assert!(!rows.is_empty());
    assert!(rows.len() <= 5);
    assert!(rows.iter().all(|r| r.similarity >= 0.75));
    assert!(rows.windows(2).all(|w| w[0].similarity >= w[1].similarity));
}

#[tokio::test]
async fn invalid_inputs_are_recoverable() {
    let dir = TempDir::new().unwrap();
    let service = test_service(&dir, Arc::new(FailingProvider));

    for err in [
        service.search_reviews("   ", None, None).await.unwrap_err(),
        service.search_reviews("heist", Some(0), None).await.unwrap_err(),
        service.search_reviews("heist", None, Some(1.5)).await.unwrap_err(),
    ] {
        assert!(err.is_recoverable(), "{err}");
    }

    // Valid input reaches the provider, whose failure is not recoverable.
    let err = service.search_reviews("heist", None, None).await.unwrap_err();
    assert!(!err.is_recoverable());
}
