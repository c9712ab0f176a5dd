//! CLI `doctor` command: run database diagnostics and print a health report.

use anyhow::{Context, Result};

use cinesift::config::CinesiftConfig;
use cinesift::db::{self, Database};
use cinesift::embedding::hashed;

/// Run database diagnostics and print a health report.
///
/// Does not build an embedding provider, so it works before the model is downloaded.
pub fn doctor(config: &CinesiftConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `cinesift import <catalog.json>` or `cinesift serve` to initialize.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    let database = Database::open(&db_path).context("failed to open database (may be corrupt)")?;
    let conn = database.connect()?;
    let report = db::check_database_health(&conn).context("failed to run health check")?;

    println!("Cinesift Health Report");
    println!("======================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!("sqlite-vec:        {}", report.sqlite_vec_version);
    println!();
    println!("Embedding model:");
    println!(
        "  Stored:          {}",
        report.embedding_model.as_deref().unwrap_or("(not set)")
    );
    println!("  Configured:      {}", configured_model(config));
    if let Some(ref stored) = report.embedding_model {
        if stored != configured_model(config) {
            println!("  WARNING: model mismatch! Similarity scores against stored reviews are meaningless.");
        } else {
            println!("  Status:          OK (match)");
        }
    }
    println!();
    println!("Row counts:");
    println!("  Movies:          {}", report.movie_count);
    println!("  Reviews:         {}", report.review_count);
    println!("  Embedded:        {}", report.embedded_review_count);
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
        println!();
        println!("Recovery steps:");
        println!("  1. Restore from a backup: cp backup.db {}", db_path.display());
        println!("  2. Or delete the database, re-import the catalog, and re-add reviews.");
    }

    Ok(())
}

/// The identifier the configured provider records in `schema_meta`.
fn configured_model(config: &CinesiftConfig) -> &str {
    match config.embedding.provider.as_str() {
        "hashed" => hashed::MODEL_NAME,
        _ => &config.embedding.model,
    }
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_sizes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
