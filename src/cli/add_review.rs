use anyhow::Result;

use cinesift::reviews::types::{AddReviewOutcome, NewReview};
use cinesift::service::ReviewService;

use super::or_dash;

pub async fn add_review(service: &ReviewService, review: NewReview) -> Result<()> {
    match service.add_review(review).await? {
        AddReviewOutcome::Created(created) => {
            println!("Review {} stored.", created.review_id);
            println!(
                "  Movie:   {} ({}) [{}]",
                created.movie_title,
                created.movie_year,
                or_dash(created.movie_genre.as_deref())
            );
            if let Some(rating) = created.movie_rating {
                println!("  Catalog rating: {rating:.1}");
            }
        }
        AddReviewOutcome::MovieNotFound { movie_id } => {
            println!("No movie with id {movie_id} in the catalog. Nothing was stored.");
            println!("Use `cinesift browse` to find the right id.");
        }
        AddReviewOutcome::Duplicate { existing_review_id } => {
            println!("That movie already has this exact review (id {existing_review_id}). Nothing was stored.");
        }
    }
    Ok(())
}
