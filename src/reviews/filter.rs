//! Typed predicate builder for review and catalog queries.
//!
//! Callers describe constraints with [`ReviewFilter`] or [`CatalogFilter`];
//! those produce a [`PredicateSet`], a conjunction of [`Predicate`]s. SQL text
//! only ever comes from the fixed fragments in [`Predicate::render`]; caller
//! values are always bound as parameters.

use rusqlite::types::Value;
use serde::Deserialize;
use std::fmt::Write;

/// One supported constraint. Column references assume the `reviews r JOIN movies m` shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// The review has a stored embedding vector.
    HasEmbedding,
    MinYear(i32),
    MaxYear(i32),
    /// Case-insensitive substring of the movie genre.
    GenreContains(String),
    /// Minimum review rating (reviews without a rating never pass).
    MinRating(i64),
    /// Case-insensitive substring of the review text.
    TextContains(String),
}

impl Predicate {
    /// Append this predicate's SQL to `sql`, binding its value (if any) as `?{param}`.
    /// Returns the number of parameters consumed.
    fn render(&self, param: usize, sql: &mut String, values: &mut Vec<Value>) -> usize {
        // write! into a String cannot fail.
        let _ = match self {
            Self::HasEmbedding => {
                sql.push_str("r.embedding IS NOT NULL");
                return 0;
            }
            Self::MinYear(year) => {
                values.push(Value::Integer(i64::from(*year)));
                write!(sql, "m.release_year >= ?{param}")
            }
            Self::MaxYear(year) => {
                values.push(Value::Integer(i64::from(*year)));
                write!(sql, "m.release_year <= ?{param}")
            }
            Self::GenreContains(genre) => {
                values.push(Value::Text(genre.clone()));
                write!(sql, "instr(casefold(m.genre), casefold(?{param})) > 0")
            }
            Self::MinRating(rating) => {
                values.push(Value::Integer(*rating));
                write!(sql, "r.rating >= ?{param}")
            }
            Self::TextContains(needle) => {
                values.push(Value::Text(needle.clone()));
                write!(sql, "instr(casefold(r.content), casefold(?{param})) > 0")
            }
        };
        1
    }
}

/// A rendered `WHERE` body plus the values for its placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedClause {
    pub sql: String,
    pub values: Vec<Value>,
}

/// A conjunction of predicates. Empty renders as a pass-through clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateSet {
    predicates: Vec<Predicate>,
}

impl PredicateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The baseline for similarity queries: only reviews with an embedding.
    pub fn embedded_reviews() -> Self {
        Self::new().and(Predicate::HasEmbedding)
    }

    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn and_opt(self, predicate: Option<Predicate>) -> Self {
        match predicate {
            Some(p) => self.and(p),
            None => self,
        }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Render as `p1 AND p2 AND ...` with placeholders numbered from `first_param`.
    pub fn render(&self, first_param: usize) -> RenderedClause {
        let mut sql = String::new();
        let mut values = Vec::new();
        let mut param = first_param;

        for (i, predicate) in self.predicates.iter().enumerate() {
            if i > 0 {
                sql.push_str(" AND ");
            }
            param += predicate.render(param, &mut sql, &mut values);
        }
        if sql.is_empty() {
            sql.push_str("1 = 1");
        }

        RenderedClause { sql, values }
    }
}

/// Blank strings count as "no constraint".
fn non_blank(s: &Option<String>) -> Option<String> {
    s.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Optional structured constraints for a filtered similarity search.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReviewFilter {
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub genre: Option<String>,
    pub min_rating: Option<i64>,
}

impl ReviewFilter {
    /// Always includes [`Predicate::HasEmbedding`], plus one predicate per supplied constraint.
    pub fn predicates(&self) -> PredicateSet {
        PredicateSet::embedded_reviews()
            .and_opt(self.min_year.map(Predicate::MinYear))
            .and_opt(self.max_year.map(Predicate::MaxYear))
            .and_opt(non_blank(&self.genre).map(Predicate::GenreContains))
            .and_opt(self.min_rating.map(Predicate::MinRating))
    }
}

/// Optional constraints for browsing the movie catalog.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CatalogFilter {
    pub genre: Option<String>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
}

impl CatalogFilter {
    pub fn predicates(&self) -> PredicateSet {
        PredicateSet::new()
            .and_opt(non_blank(&self.genre).map(Predicate::GenreContains))
            .and_opt(self.min_year.map(Predicate::MinYear))
            .and_opt(self.max_year.map(Predicate::MaxYear))
    }
}

/// Every whitespace-separated token across `keywords`, each one required.
pub fn keyword_predicates(keywords: &[String]) -> PredicateSet {
    keywords
        .iter()
        .flat_map(|k| k.split_whitespace())
        .fold(PredicateSet::new(), |set, token| {
            set.and(Predicate::TextContains(token.to_string()))
        })
}
