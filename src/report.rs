//! Scan reports - JSON hand-off from the scan engine
//!
//! A report lists the components registered during the scan and the issues
//! raised on them:
//!
//! ```json
//! {
//!   "snapshots": [{ "component_key": "comp-A", "resource_id": 42 }],
//!   "issues": [{ "key": "I1", "component_key": "comp-A",
//!                "rule_key": { "repository": "squid", "rule": "S100" },
//!                "new": true }]
//! }
//! ```
//!
//! Every issue must carry `new`: `true` issues are inserted, `false` ones
//! update the row persisted by an earlier scan. An issue without the flag
//! is rejected when the report is parsed.

use crate::Result;
use crate::cache::InMemoryIssueCache;
use crate::issue::Issue;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub component_key: String,
    pub resource_id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    #[serde(default)]
    pub snapshots: Vec<SnapshotEntry>,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

impl ScanReport {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Split into the component registrations and the issue cache
    pub fn into_parts(self) -> (Vec<SnapshotEntry>, InMemoryIssueCache) {
        let cache = self.issues.into_iter().collect();
        (self.snapshots, cache)
    }
}
