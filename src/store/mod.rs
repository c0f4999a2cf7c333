//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with one table:
//! - snapshots(repo, git_ref, captured_at, facts)
//!
//! `facts` holds the snapshot's per-domain payloads as a single JSON
//! document, so new fact domains need no schema migration.

pub mod schema;
pub mod sqlite;

pub use sqlite::{SqliteStore, StoreStats};
