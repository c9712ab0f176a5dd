//! MCP `add_review` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use cinesift::reviews::types::NewReview;

/// Parameters for the `add_review` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AddReviewParams {
    /// Catalog id of the movie being reviewed, e.g. `"tt0113277"`.
    #[schemars(description = "Catalog id of the movie being reviewed (e.g. 'tt0113277')")]
    pub movie_id: String,

    #[schemars(description = "Short headline for the review")]
    pub title: String,

    #[schemars(description = "Full review text. This is what gets embedded and searched.")]
    pub content: String,

    /// Integer rating, 1–10 inclusive.
    #[schemars(description = "Rating from 1 to 10")]
    pub rating: i64,
}

impl From<AddReviewParams> for NewReview {
    fn from(p: AddReviewParams) -> Self {
        NewReview {
            movie_id: p.movie_id,
            title: p.title,
            content: p.content,
            rating: p.rating,
        }
    }
}
