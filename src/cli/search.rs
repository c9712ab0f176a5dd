use anyhow::Result;

use cinesift::reviews::filter::ReviewFilter;
use cinesift::reviews::types::{RankedReview, SearchOutcome};
use cinesift::service::ReviewService;

use super::{or_dash, truncate};

/// Run a ranked search from the terminal. Any filter switches to the filtered
/// variant, which applies `min_similarity` only when it is given.
pub async fn search(
    service: &ReviewService,
    query: &str,
    filter: ReviewFilter,
    limit: Option<usize>,
    min_similarity: Option<f64>,
) -> Result<()> {
    let filtered = filter != ReviewFilter::default();
    let outcome = if filtered {
        service
            .search_reviews_filtered(query, filter, limit, min_similarity)
            .await?
    } else {
        service.search_reviews(query, limit, min_similarity).await?
    };

    match outcome {
        SearchOutcome::NoMatches => {
            if filtered {
                println!("No reviews match those filters.");
            } else {
                let threshold =
                    min_similarity.unwrap_or(service.search_config().min_similarity);
                println!("No reviews reached similarity {threshold:.2}.");
            }
        }
        SearchOutcome::Matches(rows) => {
            println!("Found {} review(s)\n", rows.len());
            for (i, row) in rows.iter().enumerate() {
                print_ranked(i + 1, row);
            }
        }
    }
    Ok(())
}

/// Show semantic and keyword results for the same corpus side by side.
pub async fn compare(service: &ReviewService, query: &str, keywords: Vec<String>) -> Result<()> {
    let cmp = service.compare(query, keywords).await?;

    println!("Semantic: \"{}\" ({} match(es))", cmp.query, cmp.semantic_count);
    for (i, row) in cmp.semantic_top.iter().enumerate() {
        print_ranked(i + 1, row);
    }
    if cmp.semantic_top.is_empty() {
        println!("  (none)\n");
    }

    println!(
        "Keywords: {} ({} match(es))",
        cmp.keywords.join(", "),
        cmp.lexical_count
    );
    for (i, row) in cmp.lexical_top.iter().enumerate() {
        println!(
            "  {}. {} ({}) - \"{}\"",
            i + 1,
            row.movie_title,
            row.release_year,
            truncate(&row.review_title, 60)
        );
    }
    if cmp.lexical_top.is_empty() {
        println!("  (none)");
    }
    Ok(())
}

fn print_ranked(rank: usize, row: &RankedReview) {
    let rating = row
        .review_rating
        .map(|r| format!("{r}/10"))
        .unwrap_or_else(|| "unrated".into());
    println!(
        "  {}. {} ({}) [{}] similarity {:.4}",
        rank,
        row.movie_title,
        row.release_year,
        or_dash(row.genre.as_deref()),
        row.similarity
    );
    println!("     \"{}\" - {}", truncate(&row.review_title, 80), rating);
    println!();
}
