use anyhow::Result;

use cinesift::reviews::filter::CatalogFilter;
use cinesift::service::ReviewService;

use super::{or_dash, truncate};

/// List catalog entries, newest first.
pub async fn browse(service: &ReviewService, filter: CatalogFilter, limit: Option<usize>) -> Result<()> {
    let rows = service.browse_movies(filter, limit).await?;
    if rows.is_empty() {
        println!("No movies match.");
        return Ok(());
    }

    println!("{:<12} {:<40} {:>4}  {:<24} {:>6} {:>7}", "ID", "Title", "Year", "Genre", "Rating", "Reviews");
    println!("{}", "-".repeat(98));
    for row in &rows {
        let rating = row
            .rating
            .map(|r| format!("{r:.1}"))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<12} {:<40} {:>4}  {:<24} {:>6} {:>7}",
            row.external_id,
            truncate(&row.title, 37),
            row.release_year,
            truncate(or_dash(row.genre.as_deref()), 21),
            rating,
            row.review_count
        );
    }
    Ok(())
}
