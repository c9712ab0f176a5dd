//! Typed records for every query shape the review core produces.
//!
//! One struct per shape; nothing here renders prose. [`Movie`] mirrors the
//! `movies` table, the rest are result rows and operation outcomes.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ReviewError};

/// Inclusive bounds for a review rating.
pub const RATING_RANGE: std::ops::RangeInclusive<i64> = 1..=10;

/// A catalog entry. Written only by catalog import; the core reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    /// External catalog key, e.g. `"tt0113277"`.
    pub external_id: String,
    pub title: String,
    #[serde(default)]
    pub genre: Option<String>,
    pub release_year: i32,
    /// Aggregate catalog rating, if the source had one.
    #[serde(default)]
    pub rating: Option<f64>,
}

/// Input to [`add_review`](crate::service::ReviewService::add_review).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReview {
    pub movie_id: String,
    pub title: String,
    pub content: String,
    pub rating: i64,
}

impl NewReview {
    /// Reject the review before any unit of work begins.
    pub fn validate(&self) -> Result<()> {
        if self.movie_id.trim().is_empty() {
            return Err(ReviewError::validation("movie id must not be empty"));
        }
        if self.title.trim().is_empty() {
            return Err(ReviewError::validation("review title must not be empty"));
        }
        if self.content.trim().is_empty() {
            return Err(ReviewError::validation("review text must not be empty"));
        }
        if !RATING_RANGE.contains(&self.rating) {
            return Err(ReviewError::validation(format!(
                "rating must be between {} and {}, got {}",
                RATING_RANGE.start(),
                RATING_RANGE.end(),
                self.rating
            )));
        }
        Ok(())
    }
}

/// One row of a similarity-ranked search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedReview {
    pub review_id: i64,
    pub movie_id: String,
    pub movie_title: String,
    pub review_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_rating: Option<i64>,
    pub genre: Option<String>,
    pub release_year: i32,
    /// `1 - cosine_distance`, rounded to 4 decimal places.
    pub similarity: f64,
}

/// Ranked search result. `NoMatches` is distinct from any failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "results", rename_all = "snake_case")]
pub enum SearchOutcome {
    Matches(Vec<RankedReview>),
    NoMatches,
}

impl SearchOutcome {
    pub fn from_rows(rows: Vec<RankedReview>) -> Self {
        if rows.is_empty() {
            Self::NoMatches
        } else {
            Self::Matches(rows)
        }
    }

    pub fn rows(&self) -> &[RankedReview] {
        match self {
            Self::Matches(rows) => rows,
            Self::NoMatches => &[],
        }
    }

    pub fn into_rows(self) -> Vec<RankedReview> {
        match self {
            Self::Matches(rows) => rows,
            Self::NoMatches => Vec::new(),
        }
    }
}

/// One row of a keyword (substring) search. Unranked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LexicalMatch {
    pub review_id: i64,
    pub movie_id: String,
    pub movie_title: String,
    pub review_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_rating: Option<i64>,
    pub genre: Option<String>,
    pub release_year: i32,
}

/// One row of a catalog browse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogRow {
    pub external_id: String,
    pub title: String,
    pub genre: Option<String>,
    pub release_year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    pub review_count: u64,
}

/// Confirmation of a stored review, with the movie's denormalized attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedReview {
    pub review_id: i64,
    pub movie_id: String,
    pub movie_title: String,
    pub movie_genre: Option<String>,
    pub movie_year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie_rating: Option<f64>,
}

/// Expected outcomes of an ingestion. Infrastructure failures are errors instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AddReviewOutcome {
    Created(CreatedReview),
    MovieNotFound { movie_id: String },
    /// The movie already has a review with exactly this text.
    Duplicate { existing_review_id: i64 },
}

/// Semantic and lexical results for the same corpus, side by side.
#[derive(Debug, Clone, Serialize)]
pub struct SearchComparison {
    pub query: String,
    pub keywords: Vec<String>,
    pub semantic_count: usize,
    pub lexical_count: usize,
    pub semantic_top: Vec<RankedReview>,
    pub lexical_top: Vec<LexicalMatch>,
}

/// Counts returned by a catalog import.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub inserted: u64,
    pub updated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: i64) -> NewReview {
        NewReview {
            movie_id: "tt1234567".into(),
            title: "Great Film".into(),
            content: "unmistakable unique phrase xyz123".into(),
            rating,
        }
    }

    #[test]
    fn rating_bounds_are_inclusive() {
        assert!(review(1).validate().is_ok());
        assert!(review(10).validate().is_ok());
        assert!(review(0).validate().is_err());
        assert!(review(11).validate().is_err());
        assert!(review(-3).validate().is_err());
    }

    #[test]
    fn blank_fields_are_rejected() {
        let mut r = review(8);
        r.content = "   ".into();
        let err = r.validate().unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("review text"));
    }

    #[test]
    fn empty_rows_become_no_matches() {
        assert_eq!(SearchOutcome::from_rows(vec![]), SearchOutcome::NoMatches);
        assert!(SearchOutcome::NoMatches.rows().is_empty());
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let json = serde_json::to_value(AddReviewOutcome::MovieNotFound {
            movie_id: "tt9999999".into(),
        })
        .unwrap();
        assert_eq!(json["outcome"], "movie_not_found");
        assert_eq!(json["movie_id"], "tt9999999");

        let json = serde_json::to_value(SearchOutcome::NoMatches).unwrap();
        assert_eq!(json["status"], "no_matches");
    }
}
