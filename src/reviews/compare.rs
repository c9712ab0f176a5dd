use super::types::{LexicalMatch, RankedReview, SearchComparison};

/// Put already-fetched semantic and lexical results side by side.
///
/// Counts are the full sizes of both result sets; only the first `preview`
/// rows of each are kept for display.
pub fn build_comparison(
    query: &str,
    keywords: &[String],
    semantic: Vec<RankedReview>,
    lexical: Vec<LexicalMatch>,
    preview: usize,
) -> SearchComparison {
    SearchComparison {
        query: query.to_string(),
        keywords: keywords.to_vec(),
        semantic_count: semantic.len(),
        lexical_count: lexical.len(),
        semantic_top: semantic.into_iter().take(preview).collect(),
        lexical_top: lexical.into_iter().take(preview).collect(),
    }
}
