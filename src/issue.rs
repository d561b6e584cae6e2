//! Issue types - findings recorded against scanned components
//!
//! An issue is raised by a rule on a component during a scan. Issues live
//! in memory until the scan is over, then get persisted as rows.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Issue severities, from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Minor,
    Major,
    Critical,
    Blocker,
}

impl Severity {
    /// Get the string representation of the severity
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Minor => "MINOR",
            Severity::Major => "MAJOR",
            Severity::Critical => "CRITICAL",
            Severity::Blocker => "BLOCKER",
        }
    }

    /// Get all severities
    pub fn all() -> &'static [Severity] {
        &[
            Severity::Info,
            Severity::Minor,
            Severity::Major,
            Severity::Critical,
            Severity::Blocker,
        ]
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "INFO" => Ok(Severity::Info),
            "MINOR" => Ok(Severity::Minor),
            "MAJOR" => Ok(Severity::Major),
            "CRITICAL" => Ok(Severity::Critical),
            "BLOCKER" => Ok(Severity::Blocker),
            _ => Err(Error::Parse(format!("Unknown severity: {}", s))),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Workflow status of an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IssueStatus {
    #[default]
    Open,
    Reopened,
    Resolved,
    Closed,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Open => "OPEN",
            IssueStatus::Reopened => "REOPENED",
            IssueStatus::Resolved => "RESOLVED",
            IssueStatus::Closed => "CLOSED",
        }
    }

    pub fn all() -> &'static [IssueStatus] {
        &[
            IssueStatus::Open,
            IssueStatus::Reopened,
            IssueStatus::Resolved,
            IssueStatus::Closed,
        ]
    }
}

impl FromStr for IssueStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "OPEN" => Ok(IssueStatus::Open),
            "REOPENED" => Ok(IssueStatus::Reopened),
            "RESOLVED" => Ok(IssueStatus::Resolved),
            "CLOSED" => Ok(IssueStatus::Closed),
            _ => Err(Error::Parse(format!("Unknown issue status: {}", s))),
        }
    }
}

impl std::fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identifies a rule by its repository and its key within that repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleKey {
    pub repository: String,
    pub rule: String,
}

impl RuleKey {
    pub fn new(repository: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            rule: rule.into(),
        }
    }
}

impl std::fmt::Display for RuleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.repository, self.rule)
    }
}

/// An issue raised during the current scan.
///
/// `new` tells whether the issue was first seen in this scan or carried
/// over from a previous one. It is decided by the scan engine and only
/// read when the issue is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Unique key, persisted as the row uuid
    pub key: String,
    /// Key of the scanned component the issue is attached to
    pub component_key: String,
    /// Rule that raised the issue
    pub rule_key: RuleKey,
    #[serde(default)]
    pub severity: Option<Severity>,
    /// Line number (1-indexed), absent for component-level issues
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Remediation cost
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub status: IssueStatus,
    /// Checksum of the content the issue is attached to
    #[serde(default)]
    pub checksum: Option<String>,
    #[serde(default)]
    pub manual: bool,
    #[serde(default)]
    pub manual_severity: bool,
    #[serde(default)]
    pub user_login: Option<String>,
    #[serde(default)]
    pub assignee_login: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    /// Required on input: a scan report must say whether the issue is new
    pub new: bool,
}

impl Issue {
    /// Create a new open issue with minimal required fields
    pub fn new(
        key: impl Into<String>,
        component_key: impl Into<String>,
        rule_key: RuleKey,
    ) -> Self {
        Self {
            key: key.into(),
            component_key: component_key.into(),
            rule_key,
            severity: None,
            line: None,
            title: None,
            message: None,
            cost: None,
            resolution: None,
            status: IssueStatus::Open,
            checksum: None,
            manual: false,
            manual_severity: false,
            user_login: None,
            assignee_login: None,
            created_at: None,
            updated_at: None,
            closed_at: None,
            new: true,
        }
    }

    /// True if the issue was first seen in the current scan
    pub fn is_new(&self) -> bool {
        self.new
    }

    pub fn with_new(mut self, new: bool) -> Self {
        self.new = new;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_status(mut self, status: IssueStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_assignee(mut self, login: impl Into<String>) -> Self {
        self.assignee_login = Some(login.into());
        self
    }
}
