use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `compare_search` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CompareSearchParams {
    #[schemars(description = "Natural language query for the semantic side")]
    pub query: String,

    /// Every whitespace-separated token must appear in the review text.
    #[schemars(
        description = "Keywords for the lexical side. Every word must appear in the review text (case-insensitive)."
    )]
    pub keywords: Vec<String>,
}
