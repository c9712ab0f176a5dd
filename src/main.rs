mod cli;
mod server;
mod tools;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use cinesift::config::CinesiftConfig;
use cinesift::reviews::filter::{CatalogFilter, ReviewFilter};
use cinesift::reviews::types::NewReview;
use cinesift::service::ReviewService;

#[derive(Parser)]
#[command(name = "cinesift", version, about = "Semantic movie review search over MCP")]
struct Cli {
    /// Config file to use instead of ~/.cinesift/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server
    Serve {
        /// Transport to serve on; defaults to the configured one
        #[arg(long, value_enum)]
        transport: Option<Transport>,
    },
    /// Rank reviews by similarity to a query
    Search {
        query: String,
        #[arg(long)]
        limit: Option<usize>,
        /// Similarity floor; filtered searches have none unless this is set
        #[arg(long)]
        min_similarity: Option<f64>,
        #[command(flatten)]
        filter: SearchFilterArgs,
    },
    /// Compare semantic search with keyword search
    Compare {
        query: String,
        /// Keywords that must all appear in the review text
        #[arg(required = true, num_args = 1..)]
        keywords: Vec<String>,
    },
    /// Add a review to a movie in the catalog
    AddReview {
        movie_id: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        /// Rating from 1 to 10
        #[arg(long)]
        rating: i64,
    },
    /// Browse the movie catalog, newest first
    Browse {
        #[arg(long)]
        genre: Option<String>,
        #[arg(long)]
        min_year: Option<i32>,
        #[arg(long)]
        max_year: Option<i32>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Import or update catalog entries from a JSON file
    Import { file: PathBuf },
    /// Show corpus statistics
    Stats,
    /// Run database diagnostics
    Doctor,
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
}

#[derive(Args)]
struct SearchFilterArgs {
    #[arg(long)]
    min_year: Option<i32>,
    #[arg(long)]
    max_year: Option<i32>,
    /// Genre substring, case-insensitive
    #[arg(long)]
    genre: Option<String>,
    #[arg(long)]
    min_rating: Option<i64>,
}

impl From<SearchFilterArgs> for ReviewFilter {
    fn from(a: SearchFilterArgs) -> Self {
        ReviewFilter {
            min_year: a.min_year,
            max_year: a.max_year,
            genre: a.genre,
            min_rating: a.min_rating,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Transport {
    Stdio,
    Http,
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to ~/.cinesift/models/
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CinesiftConfig::load_from(path)?,
        None => CinesiftConfig::load()?,
    };

    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { transport } => {
            let transport = transport.unwrap_or(match config.server.transport.as_str() {
                "http" => Transport::Http,
                _ => Transport::Stdio,
            });
            match transport {
                Transport::Stdio => server::serve_stdio(config).await?,
                Transport::Http => server::serve_http(config).await?,
            }
        }
        Command::Search {
            query,
            limit,
            min_similarity,
            filter,
        } => {
            let service = ReviewService::from_config(&config)?;
            cli::search::search(&service, &query, filter.into(), limit, min_similarity).await?;
        }
        Command::Compare { query, keywords } => {
            let service = ReviewService::from_config(&config)?;
            cli::search::compare(&service, &query, keywords).await?;
        }
        Command::AddReview {
            movie_id,
            title,
            content,
            rating,
        } => {
            let service = ReviewService::from_config(&config)?;
            let review = NewReview {
                movie_id,
                title,
                content,
                rating,
            };
            cli::add_review::add_review(&service, review).await?;
        }
        Command::Browse {
            genre,
            min_year,
            max_year,
            limit,
        } => {
            let service = ReviewService::from_config(&config)?;
            let filter = CatalogFilter {
                genre,
                min_year,
                max_year,
            };
            cli::browse::browse(&service, filter, limit).await?;
        }
        Command::Import { file } => {
            let service = ReviewService::from_config(&config)?;
            cli::import::import(&service, &file).await?;
        }
        Command::Stats => {
            let service = ReviewService::from_config(&config)?;
            cli::stats::stats(&service).await?;
        }
        Command::Doctor => {
            cli::doctor::doctor(&config)?;
        }
        Command::Model { action } => match action {
            ModelAction::Download => {
                cinesift::embedding::download::model_download(&config.embedding).await?;
            }
        },
    }

    Ok(())
}
