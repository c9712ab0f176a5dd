//! MCP `search_reviews` and `search_reviews_filtered` tool parameter definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `search_reviews` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchReviewsParams {
    /// Natural language description of what the reviews should be about.
    #[schemars(description = "Natural language description of the review content to find")]
    pub query: String,

    /// Maximum number of results (1–100). Defaults to 5.
    #[schemars(description = "Maximum number of results to return (1-100). Defaults to 5.")]
    pub limit: Option<usize>,

    /// Minimum similarity score (-1.0–1.0). Defaults to 0.75.
    #[schemars(description = "Minimum similarity score a review must reach (-1.0 to 1.0). Defaults to 0.75.")]
    pub min_similarity: Option<f64>,
}

/// Parameters for the `search_reviews_filtered` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchReviewsFilteredParams {
    #[schemars(description = "Natural language description of the review content to find")]
    pub query: String,

    #[schemars(description = "Only movies released in or after this year")]
    pub min_year: Option<i32>,

    #[schemars(description = "Only movies released in or before this year")]
    pub max_year: Option<i32>,

    /// Case-insensitive substring of the movie's genre string.
    #[schemars(description = "Genre substring, case-insensitive (e.g. 'drama')")]
    pub genre: Option<String>,

    #[schemars(description = "Only reviews rated at least this (1-10)")]
    pub min_rating: Option<i64>,

    #[schemars(description = "Maximum number of results to return (1-100). Defaults to 5.")]
    pub limit: Option<usize>,

    /// No similarity floor is applied unless this is set.
    #[schemars(description = "Optional minimum similarity score (-1.0 to 1.0). No cutoff when omitted.")]
    pub min_similarity: Option<f64>,
}
