//! # Issuesync - Issue persistence for code analysis scans
//!
//! Takes the issues accumulated in memory during a scan and writes them
//! into durable storage.
//!
//! Issuesync provides:
//! - An issue model shared by the scan engine and the store
//! - Snapshot and rule lookups used to resolve foreign references
//! - A synchronizer that routes every cached issue to an insert or update
//! - SQLite-backed storage with an issue query object

pub mod issue;
pub mod snapshot;
pub mod rule;
pub mod cache;
pub mod persister;
pub mod storage;
pub mod query;
pub mod report;
pub mod config;
pub mod ui;


// Re-exports for convenient access
pub use issue::{Issue, IssueStatus, RuleKey, Severity};
pub use snapshot::{Snapshot, SnapshotCache, SnapshotLookup};
pub use rule::{Rule, RuleLookup, RuleRegistry};
pub use cache::{InMemoryIssueCache, IssueCache};
pub use persister::{IssueSynchronizer, IssueWriter, SyncStats};
pub use storage::{IssueRow, SqliteStore};
pub use query::IssueQuery;

/// Result type alias for Issuesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Issuesync operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Missing dependency: {0}")]
    MissingDependency(#[from] MissingDependency),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Issue not found: {0}")]
    IssueNotFound(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True when the error is a broken upstream invariant rather than a
    /// storage or input failure
    pub fn is_missing_dependency(&self) -> bool {
        matches!(self, Error::MissingDependency(_))
    }
}

/// A foreign reference of an issue that could not be resolved.
///
/// Components are registered and rules are loaded before issues are
/// persisted, so hitting one of these aborts the synchronization pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MissingDependency {
    #[error("snapshot not found for component '{component_key}'")]
    Snapshot { component_key: String },

    #[error("rule not found: {repository_key}:{rule_key}")]
    Rule {
        repository_key: String,
        rule_key: String,
    },
}
