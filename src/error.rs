//! Error taxonomy for review search and ingestion.
//!
//! [`ReviewError::Validation`] is an expected outcome the caller should branch on.
//! Everything else is an infrastructure failure: logged, surfaced generically, and
//! never retried here. A missing movie is not an error at all; see
//! [`AddReviewOutcome`](crate::reviews::types::AddReviewOutcome).

use thiserror::Error;

use crate::embedding::EmbedError;

#[derive(Error, Debug)]
pub enum ReviewError {
    /// Caller input rejected before any storage or provider work began.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Embedding generation failed or returned an unusable vector.
    #[error("embedding provider error: {0}")]
    Provider(#[from] EmbedError),

    /// Connectivity, constraint, or transaction failure in SQLite.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// The named stage exceeded its deadline and was abandoned.
    #[error("{0} timed out")]
    Timeout(&'static str),

    /// A blocking worker panicked or was cancelled by the runtime.
    #[error("worker task failed: {0}")]
    Task(String),
}

impl ReviewError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// `true` for outcomes the caller is expected to handle (bad input);
    /// `false` for infrastructure failures.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<tokio::task::JoinError> for ReviewError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task(e.to_string())
    }
}

pub type Result<T, E = ReviewError> = std::result::Result<T, E>;
