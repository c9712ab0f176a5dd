//! Semantic search over movie reviews, served over MCP.
//!
//! Cinesift stores a movie catalog and user reviews in SQLite. Every review is
//! embedded when it is added, and queries are ranked by cosine similarity
//! against those vectors. A plain keyword search runs over the same corpus so
//! the two can be compared side by side.
//!
//! # Architecture
//!
//! - **Storage**: SQLite with [sqlite-vec](https://github.com/asg017/sqlite-vec)
//!   for cosine distance over stored `FLOAT32` blobs
//! - **Embeddings**: Local ONNX Runtime with all-MiniLM-L6-v2 (384 dimensions),
//!   or a deterministic hashed embedder for offline use
//! - **Ingestion**: lookup, embed, insert and commit as one scoped unit of work
//! - **Transport**: MCP over stdio (primary) or Streamable HTTP
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`db`] — SQLite initialization, schema, migrations, units of work, and health checks
//! - [`embedding`] — Text-to-vector embedding providers
//! - [`error`] — Error taxonomy shared by the core and the service layer
//! - [`reviews`] — Search, filtering, ingestion, comparison, and catalog queries
//! - [`service`] — Async, deadline-bounded entry points over [`reviews`]

pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod reviews;
pub mod service;
