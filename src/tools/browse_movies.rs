//! MCP `browse_movies` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use cinesift::reviews::filter::CatalogFilter;

/// Parameters for the `browse_movies` MCP tool. All filters are optional.
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct BrowseMoviesParams {
    #[schemars(description = "Genre substring, case-insensitive (e.g. 'drama')")]
    pub genre: Option<String>,

    #[schemars(description = "Only movies released in or after this year")]
    pub min_year: Option<i32>,

    #[schemars(description = "Only movies released in or before this year")]
    pub max_year: Option<i32>,

    #[schemars(description = "Maximum number of movies to return (1-100). Defaults to 20.")]
    pub limit: Option<usize>,
}

impl BrowseMoviesParams {
    pub fn filter(&self) -> CatalogFilter {
        CatalogFilter {
            genre: self.genre.clone(),
            min_year: self.min_year,
            max_year: self.max_year,
        }
    }
}
