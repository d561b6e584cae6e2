//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - issues(uuid, resource_id, rule_id, severity, line, ..., data)
//! - rules(repository_key, rule_key, name, severity)
//! - snapshots(component_key, resource_id)

pub mod row;
pub mod schema;
pub mod sqlite;

pub use row::IssueRow;
pub use sqlite::{SqliteStore, DbStats};
