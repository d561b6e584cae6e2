//! Storage shape of an issue

use crate::issue::{IssueStatus, Severity};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Persisted issue (one row of the `issues` table).
///
/// Same attributes as [`crate::Issue`], with the component and rule
/// references replaced by their durable ids.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueRow {
    pub uuid: String,
    pub resource_id: i64,
    pub rule_id: i64,
    pub severity: Option<Severity>,
    pub line: Option<u32>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub cost: Option<f64>,
    pub resolution: Option<String>,
    pub status: IssueStatus,
    pub checksum: Option<String>,
    pub manual_issue: bool,
    pub manual_severity: bool,
    pub user_login: Option<String>,
    pub assignee_login: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    /// Reserved, never written by the persister
    pub data: Option<String>,
}
