//! Database schema definitions

/// SQL to create the snapshots table
pub const CREATE_SNAPSHOTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS snapshots (
    repo TEXT NOT NULL,
    git_ref TEXT NOT NULL,
    captured_at TEXT NOT NULL,
    facts TEXT NOT NULL,
    PRIMARY KEY (repo, git_ref)
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_snapshots_repo ON snapshots(repo)",
    "CREATE INDEX IF NOT EXISTS idx_snapshots_captured ON snapshots(repo, captured_at)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_SNAPSHOTS_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
