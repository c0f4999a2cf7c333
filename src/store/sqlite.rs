//! SQLite-backed snapshot storage

use super::schema;
use crate::schema::{ExtractionSnapshot, SnapshotRef};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;

/// SQLite-backed store for extraction snapshots
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    /// Insert or replace a snapshot for its (repo, git_ref) key
    pub fn insert_snapshot(&self, snapshot: &ExtractionSnapshot) -> Result<()> {
        let facts = serde_json::to_string(&snapshot.facts_by_domain)?;
        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO snapshots (repo, git_ref, captured_at, facts)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                snapshot.repo,
                snapshot.git_ref,
                snapshot.captured_at.to_rfc3339(),
                facts,
            ],
        )?;
        Ok(())
    }

    /// Get a snapshot by repo and git ref
    pub fn get_snapshot(&self, repo: &str, git_ref: &str) -> Result<Option<ExtractionSnapshot>> {
        self.conn
            .query_row(
                "SELECT repo, git_ref, captured_at, facts FROM snapshots WHERE repo = ?1 AND git_ref = ?2",
                params![repo, git_ref],
                |row| self.row_to_snapshot(row),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a snapshot, failing with the repo's known refs when it is missing
    pub fn require_snapshot(&self, repo: &str, git_ref: &str) -> Result<ExtractionSnapshot> {
        match self.get_snapshot(repo, git_ref)? {
            Some(snapshot) => Ok(snapshot),
            None => {
                let known = self
                    .list_snapshots(repo)?
                    .into_iter()
                    .map(|s| s.git_ref)
                    .collect();
                Err(Error::SnapshotNotFound {
                    repo: repo.to_string(),
                    git_ref: git_ref.to_string(),
                    known,
                })
            }
        }
    }

    /// Get the most recently captured snapshot for a repo
    pub fn latest_snapshot(&self, repo: &str) -> Result<Option<ExtractionSnapshot>> {
        self.conn
            .query_row(
                "SELECT repo, git_ref, captured_at, facts FROM snapshots WHERE repo = ?1 ORDER BY captured_at DESC LIMIT 1",
                [repo],
                |row| self.row_to_snapshot(row),
            )
            .optional()
            .map_err(Into::into)
    }

    /// List a repo's snapshot refs, newest first
    pub fn list_snapshots(&self, repo: &str) -> Result<Vec<SnapshotRef>> {
        let mut stmt = self.conn.prepare(
            "SELECT git_ref, captured_at FROM snapshots WHERE repo = ?1 ORDER BY captured_at DESC",
        )?;

        let refs = stmt
            .query_map([repo], |row| {
                let git_ref: String = row.get(0)?;
                let captured_at = parse_timestamp(row, 1)?;
                Ok(SnapshotRef {
                    git_ref,
                    captured_at,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(refs)
    }

    /// List all repos with at least one snapshot
    pub fn list_repos(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT repo FROM snapshots ORDER BY repo")?;

        let repos = stmt
            .query_map([], |row| row.get(0))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(repos)
    }

    /// Load the latest snapshot of every repo, keyed by repo name
    pub fn latest_snapshots(&self) -> Result<BTreeMap<String, ExtractionSnapshot>> {
        let mut latest = BTreeMap::new();
        for repo in self.list_repos()? {
            if let Some(snapshot) = self.latest_snapshot(&repo)? {
                latest.insert(repo, snapshot);
            }
        }
        Ok(latest)
    }

    /// Count all snapshots
    pub fn count_snapshots(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM snapshots", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            repos: self.list_repos()?.len(),
            snapshots: self.count_snapshots()?,
        })
    }

    /// Helper to convert a row to an ExtractionSnapshot
    fn row_to_snapshot(&self, row: &rusqlite::Row) -> rusqlite::Result<ExtractionSnapshot> {
        let facts_str: String = row.get(3)?;

        let facts_by_domain: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(&facts_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        Ok(ExtractionSnapshot {
            repo: row.get(0)?,
            git_ref: row.get(1)?,
            captured_at: parse_timestamp(row, 2)?,
            facts_by_domain,
        })
    }
}

fn parse_timestamp(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub repos: usize,
    pub snapshots: usize,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Repos: {}", self.repos)?;
        writeln!(f, "  Snapshots: {}", self.snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{TypeDefinition, TypeFacts, TypeKind};
    use chrono::TimeZone;

    fn sample_snapshot(repo: &str, git_ref: &str, day: u32) -> ExtractionSnapshot {
        let captured = Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap();
        let mut snapshot = ExtractionSnapshot::new(repo, git_ref, captured);

        let mut facts = TypeFacts::default();
        facts
            .types
            .push(TypeDefinition::new("User", TypeKind::Struct, "src/user.rs", 1).with_field("id", "u64"));
        snapshot.set_type_facts(&facts).unwrap();
        snapshot
    }

    #[test]
    fn test_snapshot_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();

        let snapshot = sample_snapshot("web-app", "abc123", 1);
        store.insert_snapshot(&snapshot).unwrap();

        let retrieved = store.get_snapshot("web-app", "abc123").unwrap().unwrap();
        assert_eq!(retrieved.repo, "web-app");
        assert_eq!(retrieved.captured_at, snapshot.captured_at);
        assert_eq!(retrieved.type_facts().types.len(), 1);
        assert_eq!(retrieved.type_facts().types[0].name, "User");
    }

    #[test]
    fn test_reingest_replaces_same_ref() {
        let store = SqliteStore::open_in_memory().unwrap();

        store.insert_snapshot(&sample_snapshot("web-app", "abc123", 1)).unwrap();
        store.insert_snapshot(&sample_snapshot("web-app", "abc123", 5)).unwrap();

        assert_eq!(store.count_snapshots().unwrap(), 1);
        let retrieved = store.get_snapshot("web-app", "abc123").unwrap().unwrap();
        assert_eq!(
            retrieved.captured_at,
            Utc.with_ymd_and_hms(2025, 3, 5, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_latest_snapshot_by_capture_time() {
        let store = SqliteStore::open_in_memory().unwrap();

        store.insert_snapshot(&sample_snapshot("web-app", "old", 1)).unwrap();
        store.insert_snapshot(&sample_snapshot("web-app", "new", 9)).unwrap();

        let latest = store.latest_snapshot("web-app").unwrap().unwrap();
        assert_eq!(latest.git_ref, "new");
    }

    #[test]
    fn test_require_snapshot_reports_known_refs() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_snapshot(&sample_snapshot("web-app", "abc123", 1)).unwrap();

        let err = store.require_snapshot("web-app", "missing").unwrap_err();
        match err {
            Error::SnapshotNotFound { repo, git_ref, known } => {
                assert_eq!(repo, "web-app");
                assert_eq!(git_ref, "missing");
                assert_eq!(known, vec!["abc123"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_list_repos_and_latest_snapshots() {
        let store = SqliteStore::open_in_memory().unwrap();

        store.insert_snapshot(&sample_snapshot("api", "a1", 1)).unwrap();
        store.insert_snapshot(&sample_snapshot("web-app", "w1", 2)).unwrap();

        assert_eq!(store.list_repos().unwrap(), vec!["api", "web-app"]);

        let latest = store.latest_snapshots().unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest["api"].git_ref, "a1");
    }

    #[test]
    fn test_stats() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_snapshot(&sample_snapshot("api", "a1", 1)).unwrap();
        store.insert_snapshot(&sample_snapshot("api", "a2", 2)).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.repos, 1);
        assert_eq!(stats.snapshots, 2);
    }
}
