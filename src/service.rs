//! Async entry points over the synchronous review core.
//!
//! [`ReviewService`] owns no connection. Each call opens its own on the
//! blocking pool, runs under the configured operation deadline, and closes it
//! on every exit path. Embedding runs on the blocking pool too, under its own
//! shorter deadline.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;

use crate::config::{CinesiftConfig, LimitsConfig, SearchConfig};
use crate::db::unit_of_work::UnitOfWork;
use crate::db::{self, Database, HealthReport};
use crate::embedding::{self, check_embedding, EmbeddingProvider, EMBEDDING_DIM};
use crate::error::{Result, ReviewError};
use crate::reviews::filter::{keyword_predicates, CatalogFilter, ReviewFilter};
use crate::reviews::ingest::{self, Precheck};
use crate::reviews::stats::{self, CorpusStats};
use crate::reviews::types::{
    AddReviewOutcome, CatalogRow, CreatedReview, ImportSummary, LexicalMatch, Movie, NewReview,
    SearchComparison, SearchOutcome,
};
use crate::reviews::{catalog, compare, search};

#[derive(Clone)]
pub struct ReviewService {
    db: Database,
    embedder: Arc<dyn EmbeddingProvider>,
    search: SearchConfig,
    limits: LimitsConfig,
}

impl ReviewService {
    pub fn new(
        db: Database,
        embedder: Arc<dyn EmbeddingProvider>,
        search: SearchConfig,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            db,
            embedder,
            search,
            limits,
        }
    }

    /// Open the configured database, build the configured provider, and warn
    /// if stored vectors came from a different model.
    pub fn from_config(config: &CinesiftConfig) -> anyhow::Result<Self> {
        let db_path = config.resolved_db_path();
        let db = Database::open(&db_path)?;
        tracing::info!(db = %db_path.display(), "database ready");

        let provider = embedding::create_provider(&config.embedding)
            .context("failed to create embedding provider")?;
        let embedder: Arc<dyn EmbeddingProvider> = Arc::from(provider);

        let conn = db.connect().context("failed to connect to database")?;
        if let Some(stored) = db::migrations::ensure_embedding_model(&conn, embedder.model_name())? {
            tracing::warn!(
                stored = %stored,
                configured = %embedder.model_name(),
                "embedding model differs from the one that embedded stored reviews; similarity scores will be meaningless"
            );
        }
        tracing::info!(model = %embedder.model_name(), "embedding provider ready");

        Ok(Self::new(
            db,
            embedder,
            config.search.clone(),
            config.limits.clone(),
        ))
    }

    pub fn search_config(&self) -> &SearchConfig {
        &self.search
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    /// Unfiltered ranked search. `limit` and `min_similarity` fall back to the
    /// configured defaults.
    pub async fn search_reviews(
        &self,
        query: &str,
        limit: Option<usize>,
        min_similarity: Option<f64>,
    ) -> Result<SearchOutcome> {
        let limit = limit.unwrap_or(self.search.default_limit);
        let min_similarity = min_similarity.unwrap_or(self.search.min_similarity);
        search::validate_query(query)?;
        search::validate_limit(limit)?;
        search::validate_min_similarity(min_similarity)?;
        tracing::info!(query_len = query.len(), limit, min_similarity, "search_reviews");

        self.bounded("search_reviews", async {
            let embedding = self.embed_text(query).await?;
            let outcome = self
                .db
                .with_connection(move |conn| {
                    search::search_reviews(conn, &embedding, limit, min_similarity)
                })
                .await?;
            tracing::info!(returned = outcome.rows().len(), "search_reviews done");
            Ok(outcome)
        })
        .await
    }

    /// Ranked search restricted by `filter`. No similarity floor unless one is given.
    pub async fn search_reviews_filtered(
        &self,
        query: &str,
        filter: ReviewFilter,
        limit: Option<usize>,
        min_similarity: Option<f64>,
    ) -> Result<SearchOutcome> {
        let limit = limit.unwrap_or(self.search.default_limit);
        search::validate_query(query)?;
        search::validate_limit(limit)?;
        if let Some(threshold) = min_similarity {
            search::validate_min_similarity(threshold)?;
        }
        tracing::info!(query_len = query.len(), limit, ?filter, "search_reviews_filtered");

        self.bounded("search_reviews_filtered", async {
            let embedding = self.embed_text(query).await?;
            let outcome = self
                .db
                .with_connection(move |conn| {
                    search::search_reviews_filtered(conn, &embedding, &filter, limit, min_similarity)
                })
                .await?;
            tracing::info!(returned = outcome.rows().len(), "search_reviews_filtered done");
            Ok(outcome)
        })
        .await
    }

    pub async fn lexical_search(
        &self,
        keywords: Vec<String>,
        limit: Option<usize>,
    ) -> Result<Vec<LexicalMatch>> {
        let limit = limit.unwrap_or(self.search.default_limit);
        self.bounded("lexical_search", async {
            self.db
                .with_connection(move |conn| search::lexical_search(conn, &keywords, limit))
                .await
        })
        .await
    }

    /// Add a review as one unit of work: movie lookup, duplicate check, insert,
    /// commit. Dropping the returned future before it completes rolls
    /// everything back.
    ///
    /// The text is embedded before the write lock is taken, so concurrent
    /// ingestions only serialize on the short lookup-and-insert step. A cheap
    /// lookup outside the unit of work skips the embedding call for reviews
    /// that cannot be stored; the unit of work repeats it before inserting.
    pub async fn add_review(&self, review: NewReview) -> Result<AddReviewOutcome> {
        if let Err(e) = review.validate() {
            tracing::warn!(movie_id = %review.movie_id, error = %e, "review rejected");
            return Err(e);
        }
        tracing::info!(
            movie_id = %review.movie_id,
            content_len = review.content.len(),
            "add_review"
        );
        self.bounded("add_review", self.ingest(review)).await
    }

    async fn ingest(&self, review: NewReview) -> Result<AddReviewOutcome> {
        let review = Arc::new(review);

        let early = {
            let review = Arc::clone(&review);
            self.db
                .with_connection(move |conn| ingest::precheck(conn, &review))
                .await?
        };
        if let Err(outcome) = ready_movie(early, &review) {
            tracing::warn!(movie_id = %review.movie_id, ?outcome, "review not ingested");
            return Ok(outcome);
        }

        let embedding = self.embed_text(&review.content).await?;

        let uow = self.db.begin().await?;
        let guard = uow.cancel_guard();
        let written = {
            let review = Arc::clone(&review);
            tokio::task::spawn_blocking(move || write_review(uow, &review, &embedding)).await??
        };
        guard.disarm();

        match written {
            Ok(created) => {
                tracing::info!(
                    review_id = created.review_id,
                    movie_id = %created.movie_id,
                    "review stored"
                );
                Ok(AddReviewOutcome::Created(created))
            }
            Err(outcome) => {
                tracing::warn!(movie_id = %review.movie_id, ?outcome, "review not ingested");
                Ok(outcome)
            }
        }
    }

    /// Semantic and keyword search over the same corpus, run concurrently.
    pub async fn compare(&self, query: &str, keywords: Vec<String>) -> Result<SearchComparison> {
        search::validate_query(query)?;
        if keyword_predicates(&keywords).is_empty() {
            return Err(ReviewError::validation("at least one keyword is required"));
        }
        let limit = self.search.compare_limit;
        let min_similarity = self.search.min_similarity;
        let preview = self.search.compare_preview;
        tracing::info!(query_len = query.len(), keywords = keywords.len(), "compare");

        self.bounded("compare", async {
            let semantic = async {
                let embedding = self.embed_text(query).await?;
                self.db
                    .with_connection(move |conn| {
                        search::search_reviews(conn, &embedding, limit, min_similarity)
                    })
                    .await
            };
            let lexical = {
                let keywords = keywords.clone();
                self.db
                    .with_connection(move |conn| search::lexical_search(conn, &keywords, limit))
            };

            let (semantic, lexical) = tokio::join!(semantic, lexical);
            let comparison = compare::build_comparison(
                query,
                &keywords,
                semantic?.into_rows(),
                lexical?,
                preview,
            );
            tracing::info!(
                semantic = comparison.semantic_count,
                lexical = comparison.lexical_count,
                "compare done"
            );
            Ok(comparison)
        })
        .await
    }

    pub async fn browse_movies(
        &self,
        filter: CatalogFilter,
        limit: Option<usize>,
    ) -> Result<Vec<CatalogRow>> {
        let limit = limit.unwrap_or(self.search.browse_limit);
        self.bounded("browse_movies", async {
            self.db
                .with_connection(move |conn| catalog::browse_movies(conn, &filter, limit))
                .await
        })
        .await
    }

    pub async fn get_movie(&self, external_id: &str) -> Result<Option<CatalogRow>> {
        let external_id = external_id.to_string();
        self.bounded("get_movie", async {
            self.db
                .with_connection(move |conn| catalog::get_movie(conn, &external_id))
                .await
        })
        .await
    }

    pub async fn import_movies(&self, movies: Vec<Movie>) -> Result<ImportSummary> {
        self.bounded("import_movies", async {
            self.db
                .with_connection(move |conn| catalog::import_movies(conn, &movies))
                .await
        })
        .await
    }

    pub async fn stats(&self) -> Result<CorpusStats> {
        self.bounded("stats", async {
            self.db.with_connection(|conn| stats::corpus_stats(conn)).await
        })
        .await
    }

    pub async fn health(&self) -> Result<HealthReport> {
        self.bounded("health", async {
            self.db
                .with_connection(|conn| Ok(db::check_database_health(conn)?))
                .await
        })
        .await
    }

    /// Embed on the blocking pool under the embed deadline and verify the vector
    /// fits storage. A timed-out worker is abandoned; its result is discarded.
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let provider = Arc::clone(&self.embedder);
        let text = text.to_string();
        let task = tokio::task::spawn_blocking(move || provider.embed(&text));

        let embedding = match tokio::time::timeout(self.limits.embed_timeout(), task).await {
            Ok(joined) => joined??,
            Err(_) => {
                tracing::error!(
                    timeout_ms = self.limits.embed_timeout_ms,
                    "embedding timed out"
                );
                return Err(ReviewError::Timeout("embedding"));
            }
        };
        check_embedding(&embedding, EMBEDDING_DIM)?;
        Ok(embedding)
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let result = match tokio::time::timeout(self.limits.operation_timeout(), fut).await {
            Ok(result) => result,
            Err(_) => Err(ReviewError::Timeout(operation)),
        };
        if let Err(e) = &result {
            if !e.is_recoverable() {
                tracing::error!(operation, error = %e, "operation failed");
            }
        }
        result
    }
}

fn ready_movie(
    precheck: Precheck,
    review: &NewReview,
) -> std::result::Result<Movie, AddReviewOutcome> {
    match precheck {
        Precheck::Ready(movie) => Ok(movie),
        Precheck::MovieNotFound => Err(AddReviewOutcome::MovieNotFound {
            movie_id: review.movie_id.clone(),
        }),
        Precheck::Duplicate { existing_review_id } => {
            Err(AddReviewOutcome::Duplicate { existing_review_id })
        }
    }
}

/// The write half of ingestion: re-run the lookup inside the unit of work,
/// then insert and commit. Rolls back and returns the outcome when the movie
/// vanished or an identical review landed while the text was being embedded.
fn write_review(
    uow: UnitOfWork,
    review: &NewReview,
    embedding: &[f32],
) -> Result<std::result::Result<CreatedReview, AddReviewOutcome>> {
    let movie = match ready_movie(ingest::precheck(uow.conn(), review)?, review) {
        Ok(movie) => movie,
        Err(outcome) => {
            uow.rollback()?;
            return Ok(Err(outcome));
        }
    };
    let created = ingest::insert_review(uow.conn(), review, &movie, embedding, EMBEDDING_DIM)?;
    uow.commit()?;
    Ok(Ok(created))
}
