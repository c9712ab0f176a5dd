use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use cinesift::reviews::types::Movie;
use cinesift::service::ReviewService;

/// Catalog import format: `{"movies": [{"external_id": ..., "title": ..., ...}]}`.
#[derive(Debug, Deserialize)]
struct ImportData {
    movies: Vec<Movie>,
}

/// Upsert catalog entries from a JSON file. The whole file is applied or nothing is.
pub async fn import(service: &ReviewService, file: &Path) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read import file: {}", file.display()))?;
    let data: ImportData = serde_json::from_str(&json).context("failed to parse import JSON")?;

    println!("Importing {} movies...", data.movies.len());
    let summary = service.import_movies(data.movies).await?;
    println!(
        "Import complete: {} inserted, {} updated.",
        summary.inserted, summary.updated
    );
    Ok(())
}
