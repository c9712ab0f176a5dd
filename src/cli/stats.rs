use anyhow::Result;

use cinesift::service::ReviewService;

/// Display corpus statistics in the terminal.
pub async fn stats(service: &ReviewService) -> Result<()> {
    let response = service.stats().await?;

    println!("Corpus Statistics");
    println!("{}", "=".repeat(40));
    println!("  Movies:              {}", response.total_movies);
    println!("  Reviews:             {}", response.total_reviews);
    println!("  Embedded:            {}", response.embedded_reviews);
    println!("  Not embedded:        {}", response.unembedded_reviews);
    println!();

    if !response.reviews_by_genre.is_empty() {
        println!("Reviews by Genre:");
        for (genre, count) in &response.reviews_by_genre {
            println!("  {:<24} {}", genre, count);
        }
        println!();
    }

    if let Some(ref oldest) = response.oldest_review {
        println!("Oldest review:         {oldest}");
    }
    if let Some(ref newest) = response.newest_review {
        println!("Newest review:         {newest}");
    }

    Ok(())
}
