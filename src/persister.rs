//! Issue persister - drains the issue cache into durable storage
//!
//! Every cached issue goes through the same steps:
//! 1. Resolve its component key to a snapshot
//! 2. Resolve its rule key to a rule
//! 3. Map it to an [`IssueRow`]
//! 4. Insert the row if the issue is new, update it otherwise
//!
//! A missing snapshot or rule aborts the pass. Rows written before the
//! failure stay written.

use crate::cache::IssueCache;
use crate::issue::Issue;
use crate::rule::RuleLookup;
use crate::snapshot::SnapshotLookup;
use crate::storage::IssueRow;
use crate::{MissingDependency, Result};

/// Write side of the issue store
pub trait IssueWriter {
    fn insert(&self, row: &IssueRow) -> Result<()>;

    fn update(&self, rows: &[IssueRow]) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SyncStats {
    pub inserted: usize,
    pub updated: usize,
}

impl SyncStats {
    pub fn total(&self) -> usize {
        self.inserted + self.updated
    }
}

pub struct IssueSynchronizer<'a> {
    cache: &'a dyn IssueCache,
    snapshots: &'a dyn SnapshotLookup,
    rules: &'a dyn RuleLookup,
    writer: &'a dyn IssueWriter,
}

impl<'a> IssueSynchronizer<'a> {
    pub fn new(
        cache: &'a dyn IssueCache,
        snapshots: &'a dyn SnapshotLookup,
        rules: &'a dyn RuleLookup,
        writer: &'a dyn IssueWriter,
    ) -> Self {
        Self {
            cache,
            snapshots,
            rules,
            writer,
        }
    }

    /// Run the single synchronization pass of this scan.
    ///
    /// Consumes the synchronizer: a pass cannot be restarted or re-entered.
    pub fn synchronize(self) -> Result<SyncStats> {
        let mut stats = SyncStats::default();

        for issue in self.cache.issues() {
            let snapshot = self.snapshots.get(&issue.component_key).ok_or_else(|| {
                MissingDependency::Snapshot {
                    component_key: issue.component_key.clone(),
                }
            })?;

            let rule = self
                .rules
                .find_by_key(&issue.rule_key.repository, &issue.rule_key.rule)?
                .ok_or_else(|| MissingDependency::Rule {
                    repository_key: issue.rule_key.repository.clone(),
                    rule_key: issue.rule_key.rule.clone(),
                })?;

            let row = to_issue_row(issue, snapshot.resource_id, rule.id);
            if issue.is_new() {
                tracing::debug!("Inserting issue {} ({})", issue.key, issue.rule_key);
                self.writer.insert(&row)?;
                stats.inserted += 1;
            } else {
                // Single-element batch; the writer accepts larger ones
                tracing::debug!("Updating issue {} ({})", issue.key, issue.rule_key);
                self.writer.update(std::slice::from_ref(&row))?;
                stats.updated += 1;
            }
        }

        tracing::info!(
            "Persisted {} issues ({} inserted, {} updated)",
            stats.total(),
            stats.inserted,
            stats.updated
        );
        Ok(stats)
    }
}

/// Project an issue onto its storage shape.
///
/// Component and rule references are replaced by their resolved ids.
/// `data` is part of the row shape but never filled here.
pub fn to_issue_row(issue: &Issue, resource_id: i64, rule_id: i64) -> IssueRow {
    IssueRow {
        uuid: issue.key.clone(),
        resource_id,
        rule_id,
        severity: issue.severity,
        line: issue.line,
        title: issue.title.clone(),
        message: issue.message.clone(),
        cost: issue.cost,
        resolution: issue.resolution.clone(),
        status: issue.status,
        checksum: issue.checksum.clone(),
        manual_issue: issue.manual,
        manual_severity: issue.manual_severity,
        user_login: issue.user_login.clone(),
        assignee_login: issue.assignee_login.clone(),
        created_at: issue.created_at,
        updated_at: issue.updated_at,
        closed_at: issue.closed_at,
        data: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryIssueCache;
    use crate::issue::{IssueStatus, RuleKey, Severity};
    use crate::rule::{Rule, RuleRegistry};
    use crate::snapshot::{Snapshot, SnapshotCache};
    use crate::storage::SqliteStore;
    use crate::Error;
    use chrono::{TimeZone, Utc};
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Insert(IssueRow),
        Update(Vec<IssueRow>),
    }

    #[derive(Default)]
    struct RecordingWriter {
        calls: RefCell<Vec<Call>>,
    }

    impl IssueWriter for RecordingWriter {
        fn insert(&self, row: &IssueRow) -> Result<()> {
            self.calls.borrow_mut().push(Call::Insert(row.clone()));
            Ok(())
        }

        fn update(&self, rows: &[IssueRow]) -> Result<()> {
            self.calls.borrow_mut().push(Call::Update(rows.to_vec()));
            Ok(())
        }
    }

    struct FailingWriter;

    impl IssueWriter for FailingWriter {
        fn insert(&self, _row: &IssueRow) -> Result<()> {
            Err(Error::Storage(rusqlite::Error::InvalidQuery))
        }

        fn update(&self, _rows: &[IssueRow]) -> Result<()> {
            Err(Error::Storage(rusqlite::Error::InvalidQuery))
        }
    }

    struct FailingRules;

    impl RuleLookup for FailingRules {
        fn find_by_key(&self, _repository_key: &str, _rule_key: &str) -> Result<Option<Rule>> {
            Err(Error::Storage(rusqlite::Error::InvalidQuery))
        }
    }

    fn snapshots() -> SnapshotCache {
        let mut cache = SnapshotCache::new();
        cache.put(Snapshot::new(1, 42, "comp-A"));
        cache
    }

    fn rules() -> RuleRegistry {
        vec![Rule::new(7, "squid", "S100")].into_iter().collect()
    }

    fn squid_issue(key: &str, new: bool) -> Issue {
        Issue::new(key, "comp-A", RuleKey::new("squid", "S100")).with_new(new)
    }

    #[test]
    fn test_new_and_existing_issues_are_routed() {
        let cache: InMemoryIssueCache = vec![squid_issue("I1", true), squid_issue("I2", false)]
            .into_iter()
            .collect();
        let snapshots = snapshots();
        let rules = rules();
        let writer = RecordingWriter::default();

        let stats = IssueSynchronizer::new(&cache, &snapshots, &rules, &writer)
            .synchronize()
            .unwrap();
        assert_eq!(stats, SyncStats { inserted: 1, updated: 1 });

        let calls = writer.calls.into_inner();
        assert_eq!(calls.len(), 2);
        match &calls[0] {
            Call::Insert(row) => {
                assert_eq!(row.uuid, "I1");
                assert_eq!(row.resource_id, 42);
                assert_eq!(row.rule_id, 7);
            }
            other => panic!("expected insert, got {:?}", other),
        }
        match &calls[1] {
            Call::Update(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].uuid, "I2");
                assert_eq!(rows[0].resource_id, 42);
                assert_eq!(rows[0].rule_id, 7);
            }
            other => panic!("expected update, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_snapshot_aborts_before_any_write() {
        let cache: InMemoryIssueCache = vec![Issue::new("I1", "comp-X", RuleKey::new("squid", "S100"))]
            .into_iter()
            .collect();
        let snapshots = snapshots();
        let rules = rules();
        let writer = RecordingWriter::default();

        let err = IssueSynchronizer::new(&cache, &snapshots, &rules, &writer)
            .synchronize()
            .unwrap_err();

        assert!(err.is_missing_dependency());
        match err {
            Error::MissingDependency(MissingDependency::Snapshot { component_key }) => {
                assert_eq!(component_key, "comp-X");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(writer.calls.borrow().is_empty());
    }

    #[test]
    fn test_missing_rule_stops_the_pass() {
        let cache: InMemoryIssueCache = vec![
            squid_issue("I1", true),
            Issue::new("I2", "comp-A", RuleKey::new("squid", "S999")),
            squid_issue("I3", true),
        ]
        .into_iter()
        .collect();
        let snapshots = snapshots();
        let rules = rules();
        let writer = RecordingWriter::default();

        let err = IssueSynchronizer::new(&cache, &snapshots, &rules, &writer)
            .synchronize()
            .unwrap_err();

        match err {
            Error::MissingDependency(MissingDependency::Rule { repository_key, rule_key }) => {
                assert_eq!(repository_key, "squid");
                assert_eq!(rule_key, "S999");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        // I1 was written before the failure, I3 never is
        let calls = writer.calls.into_inner();
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0], Call::Insert(row) if row.uuid == "I1"));
    }

    #[test]
    fn test_missing_snapshot_keeps_earlier_writes() {
        let cache: InMemoryIssueCache = vec![
            squid_issue("I1", true),
            Issue::new("I2", "comp-X", RuleKey::new("squid", "S100")),
            squid_issue("I3", false),
        ]
        .into_iter()
        .collect();
        let snapshots = snapshots();
        let rules = rules();
        let writer = RecordingWriter::default();

        let err = IssueSynchronizer::new(&cache, &snapshots, &rules, &writer)
            .synchronize()
            .unwrap_err();

        assert!(matches!(
            err,
            Error::MissingDependency(MissingDependency::Snapshot { ref component_key }) if component_key == "comp-X"
        ));
        let calls = writer.calls.into_inner();
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0], Call::Insert(row) if row.uuid == "I1"));
    }

    #[test]
    fn test_snapshot_is_resolved_before_rule() {
        let cache: InMemoryIssueCache = vec![Issue::new("I1", "comp-X", RuleKey::new("squid", "S999"))]
            .into_iter()
            .collect();
        let snapshots = snapshots();
        let rules = rules();
        let writer = RecordingWriter::default();

        let err = IssueSynchronizer::new(&cache, &snapshots, &rules, &writer)
            .synchronize()
            .unwrap_err();

        assert!(matches!(err, Error::MissingDependency(MissingDependency::Snapshot { .. })));
        assert!(writer.calls.borrow().is_empty());
    }

    #[test]
    fn test_rule_lookup_error_propagates_unchanged() {
        let cache: InMemoryIssueCache = vec![squid_issue("I1", true), squid_issue("I2", false)]
            .into_iter()
            .collect();
        let snapshots = snapshots();
        let writer = RecordingWriter::default();

        let err = IssueSynchronizer::new(&cache, &snapshots, &FailingRules, &writer)
            .synchronize()
            .unwrap_err();

        assert!(!err.is_missing_dependency());
        assert!(matches!(err, Error::Storage(rusqlite::Error::InvalidQuery)));
        assert!(writer.calls.borrow().is_empty());
    }

    #[test]
    fn test_storage_error_propagates_unchanged() {
        let cache: InMemoryIssueCache = vec![squid_issue("I1", true)].into_iter().collect();
        let snapshots = snapshots();
        let rules = rules();

        let err = IssueSynchronizer::new(&cache, &snapshots, &rules, &FailingWriter)
            .synchronize()
            .unwrap_err();

        assert!(!err.is_missing_dependency());
        assert!(matches!(err, Error::Storage(rusqlite::Error::InvalidQuery)));
    }

    #[test]
    fn test_empty_cache_writes_nothing() {
        let cache = InMemoryIssueCache::new();
        let snapshots = SnapshotCache::new();
        let rules = RuleRegistry::new();
        let writer = RecordingWriter::default();

        let stats = IssueSynchronizer::new(&cache, &snapshots, &rules, &writer)
            .synchronize()
            .unwrap();
        assert_eq!(stats.total(), 0);
        assert!(writer.calls.borrow().is_empty());
    }

    #[test]
    fn test_row_mapping_carries_every_attribute() {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let updated = Utc.with_ymd_and_hms(2024, 3, 2, 11, 30, 0).unwrap();
        let closed = Utc.with_ymd_and_hms(2024, 3, 3, 9, 15, 0).unwrap();

        let issue = Issue {
            key: "ABCDE".to_string(),
            component_key: "comp-A".to_string(),
            rule_key: RuleKey::new("squid", "S100"),
            severity: Some(Severity::Critical),
            line: Some(17),
            title: Some("Avoid cycles".to_string()),
            message: Some("Remove this cycle".to_string()),
            cost: Some(3.5),
            resolution: Some("FIXED".to_string()),
            status: IssueStatus::Closed,
            checksum: Some("c0ffee".to_string()),
            manual: true,
            manual_severity: true,
            user_login: Some("arthur".to_string()),
            assignee_login: Some("gargantua".to_string()),
            created_at: Some(created),
            updated_at: Some(updated),
            closed_at: Some(closed),
            new: false,
        };

        let row = to_issue_row(&issue, 42, 7);
        assert_eq!(
            row,
            IssueRow {
                uuid: "ABCDE".to_string(),
                resource_id: 42,
                rule_id: 7,
                severity: Some(Severity::Critical),
                line: Some(17),
                title: Some("Avoid cycles".to_string()),
                message: Some("Remove this cycle".to_string()),
                cost: Some(3.5),
                resolution: Some("FIXED".to_string()),
                status: IssueStatus::Closed,
                checksum: Some("c0ffee".to_string()),
                manual_issue: true,
                manual_severity: true,
                user_login: Some("arthur".to_string()),
                assignee_login: Some("gargantua".to_string()),
                created_at: Some(created),
                updated_at: Some(updated),
                closed_at: Some(closed),
                data: None,
            }
        );
    }

    #[test]
    fn test_row_keeps_severity_and_assignee() {
        let issue = squid_issue("I1", true)
            .with_severity(Severity::Blocker)
            .with_assignee("gargantua")
            .with_line(3);

        let row = to_issue_row(&issue, 42, 7);
        assert_eq!(row.severity, Some(Severity::Blocker));
        assert_eq!(row.assignee_login.as_deref(), Some("gargantua"));
        assert_eq!(row.line, Some(3));
        assert!(row.data.is_none());
    }

    #[test]
    fn test_synchronize_into_sqlite() {
        let store = SqliteStore::open_in_memory().unwrap();
        let rule = store.insert_rule("squid", "S100", Some("Cycles"), None).unwrap();
        let mut snapshots = SnapshotCache::new();
        snapshots.put(store.insert_snapshot("comp-A", 42).unwrap());

        // First scan: the issue is new
        let first: InMemoryIssueCache = vec![squid_issue("I1", true).with_message("first")]
            .into_iter()
            .collect();
        IssueSynchronizer::new(&first, &snapshots, &store, &store)
            .synchronize()
            .unwrap();

        // Second scan: the same issue is carried over and resolved
        let second: InMemoryIssueCache = vec![
            squid_issue("I1", false)
                .with_message("second")
                .with_status(IssueStatus::Resolved),
        ]
        .into_iter()
        .collect();
        let stats = IssueSynchronizer::new(&second, &snapshots, &store, &store)
            .synchronize()
            .unwrap();
        assert_eq!(stats.updated, 1);

        let row = store.get_issue("I1").unwrap().unwrap();
        assert_eq!(row.rule_id, rule.id);
        assert_eq!(row.resource_id, 42);
        assert_eq!(row.message.as_deref(), Some("second"));
        assert_eq!(row.status, IssueStatus::Resolved);
        assert_eq!(store.count_issues().unwrap(), 1);
    }
}
