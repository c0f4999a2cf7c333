//! # Archscope - Architecture Knowledge Graph & Impact Analysis
//!
//! Archscope consumes extraction snapshots produced by external per-language
//! front ends and answers architecture questions over them:
//! - Which types form cross-service data contracts (type-similarity matching)
//! - What breaks if a function or service fails (bounded call-graph traversal
//!   and blast-radius analysis)
//! - How repositories depend on each other (multi-layer topology inference)
//! - What changed between two revisions (snapshot diffing)
//!
//! All analyses are pure, synchronous functions over already-materialized
//! snapshots. The only I/O boundary is the SQLite-backed snapshot store.

pub mod schema;
pub mod frontend;
pub mod matcher;
pub mod callgraph;
pub mod topology;
pub mod differ;
pub mod render;
pub mod store;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use schema::{CallEdge, ExtractionSnapshot, ServiceInfo, TypeDefinition, TypeKind};
pub use store::SqliteStore;

/// Result type alias for Archscope operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Archscope operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("No snapshot for {repo}@{git_ref} (known refs: {})", .known.join(", "))]
    SnapshotNotFound {
        repo: String,
        git_ref: String,
        known: Vec<String>,
    },

    #[error("Unknown repository '{name}' (closest: {})", .candidates.join(", "))]
    UnknownRepo {
        name: String,
        candidates: Vec<String>,
    },

    #[error("Extractor error: {0}")]
    Extractor(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
