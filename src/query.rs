//! Issue query - immutable filter over persisted issues
//!
//! Filters are ANDed across fields and ORed within a field. An empty
//! filter matches everything.

use crate::issue::{IssueStatus, Severity};
use crate::{Error, Result};
use serde::Serialize;

pub const DEFAULT_LIMIT: usize = 100;
pub const MAX_LIMIT: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueQuery {
    keys: Vec<String>,
    severities: Vec<Severity>,
    statuses: Vec<IssueStatus>,
    assignee_logins: Vec<String>,
    limit: usize,
    offset: usize,
}

impl IssueQuery {
    pub fn builder() -> IssueQueryBuilder {
        IssueQueryBuilder::default()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn severities(&self) -> &[Severity] {
        &self.severities
    }

    pub fn statuses(&self) -> &[IssueStatus] {
        &self.statuses
    }

    pub fn assignee_logins(&self) -> &[String] {
        &self.assignee_logins
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Default for IssueQuery {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            severities: Vec::new(),
            statuses: Vec::new(),
            assignee_logins: Vec::new(),
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IssueQueryBuilder {
    keys: Vec<String>,
    severities: Vec<Severity>,
    statuses: Vec<IssueStatus>,
    assignee_logins: Vec<String>,
    limit: Option<usize>,
    offset: usize,
}

impl IssueQueryBuilder {
    pub fn keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn severities(mut self, severities: impl IntoIterator<Item = Severity>) -> Self {
        self.severities = severities.into_iter().collect();
        self
    }

    pub fn statuses(mut self, statuses: impl IntoIterator<Item = IssueStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    pub fn assignee_logins<I, S>(mut self, logins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assignee_logins = logins.into_iter().map(Into::into).collect();
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn build(self) -> Result<IssueQuery> {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 || limit > MAX_LIMIT {
            return Err(Error::InvalidQuery(format!(
                "limit must be between 1 and {}, got {}",
                MAX_LIMIT, limit
            )));
        }
        if i64::try_from(self.offset).is_err() {
            return Err(Error::InvalidQuery(format!(
                "offset must be at most {}, got {}",
                i64::MAX,
                self.offset
            )));
        }

        Ok(IssueQuery {
            keys: self.keys,
            severities: self.severities,
            statuses: self.statuses,
            assignee_logins: self.assignee_logins,
            limit,
            offset: self.offset,
        })
    }
}
