pub mod add_review;
pub mod browse_movies;
pub mod compare_search;
pub mod search_reviews;

use add_review::AddReviewParams;
use browse_movies::BrowseMoviesParams;
use compare_search::CompareSearchParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use search_reviews::{SearchReviewsFilteredParams, SearchReviewsParams};
use serde::Serialize;

use cinesift::error::ReviewError;
use cinesift::reviews::filter::ReviewFilter;
use cinesift::service::ReviewService;

/// The Cinesift MCP tool handler. Holds the review service and exposes all
/// MCP tools via the `#[tool_router]` macro.
#[derive(Clone)]
pub struct CinesiftTools {
    tool_router: ToolRouter<Self>,
    service: ReviewService,
}

#[tool_router]
impl CinesiftTools {
    pub fn new(service: ReviewService) -> Self {
        Self {
            tool_router: Self::tool_router(),
            service,
        }
    }

    /// Rank reviews by semantic similarity to a query.
    #[tool(description = "Find reviews whose content is semantically similar to a natural language query. Only reviews at or above the similarity threshold are returned.")]
    async fn search_reviews(
        &self,
        Parameters(params): Parameters<SearchReviewsParams>,
    ) -> Result<String, String> {
        let outcome = self
            .service
            .search_reviews(&params.query, params.limit, params.min_similarity)
            .await
            .map_err(tool_error)?;
        to_json(&outcome)
    }

    /// Rank reviews by similarity within a year/genre/rating filter.
    #[tool(description = "Semantic review search restricted by optional release year range, genre substring, and minimum review rating.")]
    async fn search_reviews_filtered(
        &self,
        Parameters(params): Parameters<SearchReviewsFilteredParams>,
    ) -> Result<String, String> {
        let filter = ReviewFilter {
            min_year: params.min_year,
            max_year: params.max_year,
            genre: params.genre,
            min_rating: params.min_rating,
        };
        let outcome = self
            .service
            .search_reviews_filtered(&params.query, filter, params.limit, params.min_similarity)
            .await
            .map_err(tool_error)?;
        to_json(&outcome)
    }

    /// Add a review to an existing movie and embed it.
    #[tool(description = "Add a review for a movie in the catalog. The review text is embedded so it becomes searchable immediately. Returns movie_not_found if the id is unknown.")]
    async fn add_review(
        &self,
        Parameters(params): Parameters<AddReviewParams>,
    ) -> Result<String, String> {
        let outcome = self
            .service
            .add_review(params.into())
            .await
            .map_err(tool_error)?;
        to_json(&outcome)
    }

    /// Semantic vs. keyword search, side by side.
    #[tool(description = "Compare semantic search for a query with plain keyword search over the same reviews. Returns both result counts and the top entries of each.")]
    async fn compare_search(
        &self,
        Parameters(params): Parameters<CompareSearchParams>,
    ) -> Result<String, String> {
        let comparison = self
            .service
            .compare(&params.query, params.keywords)
            .await
            .map_err(tool_error)?;
        to_json(&comparison)
    }

    /// Browse the movie catalog.
    #[tool(description = "List movies in the catalog, newest first, optionally filtered by genre and release year range. Includes each movie's review count.")]
    async fn browse_movies(
        &self,
        Parameters(params): Parameters<BrowseMoviesParams>,
    ) -> Result<String, String> {
        let rows = self
            .service
            .browse_movies(params.filter(), params.limit)
            .await
            .map_err(tool_error)?;
        to_json(&rows)
    }
}

#[tool_handler]
impl ServerHandler for CinesiftTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "Cinesift searches movie reviews by meaning. Use search_reviews or \
                 search_reviews_filtered to find reviews, add_review to contribute one, \
                 browse_movies to find movie ids, and compare_search to contrast semantic \
                 and keyword results."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("serialization failed: {e}"))
}

/// Input problems go back to the caller verbatim. Infrastructure failures were
/// already logged by the service; the caller only learns which kind it was.
fn tool_error(err: ReviewError) -> String {
    match err {
        ReviewError::Validation(msg) => msg,
        ReviewError::Timeout(stage) => format!("{stage} timed out, try again later"),
        ReviewError::Provider(_) => "embedding service unavailable".into(),
        ReviewError::Storage(_) | ReviewError::Task(_) => "internal storage error".into(),
    }
}
