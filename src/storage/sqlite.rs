//! SQLite storage implementation

use std::path::Path;
use rusqlite::{Connection, params, params_from_iter, OptionalExtension};
use rusqlite::types::Value;
use crate::{Result, Error};
use crate::issue::{IssueStatus, Severity};
use crate::persister::IssueWriter;
use crate::query::IssueQuery;
use crate::rule::{Rule, RuleLookup};
use crate::snapshot::{Snapshot, SnapshotCache};
use super::row::IssueRow;
use super::schema;

const ISSUE_COLUMNS: &str = "uuid, resource_id, rule_id, severity, line, title, message, cost, resolution, status, checksum, manual_issue, manual_severity, user_login, assignee_login, created_at, updated_at, closed_at, data";

/// SQLite-backed storage for issues, rules and snapshots
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

    // ========== Issue Operations ==========

    /// Insert a new issue row
    pub fn insert_issue(&self, row: &IssueRow) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO issues ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
                ISSUE_COLUMNS
            ),
            params![
                row.uuid,
                row.resource_id,
                row.rule_id,
                row.severity.map(|s| s.as_str()),
                row.line,
                row.title,
                row.message,
                row.cost,
                row.resolution,
                row.status.as_str(),
                row.checksum,
                row.manual_issue,
                row.manual_severity,
                row.user_login,
                row.assignee_login,
                row.created_at,
                row.updated_at,
                row.closed_at,
                row.data,
            ],
        )?;
        Ok(())
    }

    /// Update existing issue rows, matched by uuid.
    ///
    /// The batch is applied in one transaction; an unknown uuid rolls the
    /// whole batch back.
    pub fn update_issues(&self, rows: &[IssueRow]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                UPDATE issues SET
                    resource_id = ?2, rule_id = ?3, severity = ?4, line = ?5, title = ?6,
                    message = ?7, cost = ?8, resolution = ?9, status = ?10, checksum = ?11,
                    manual_issue = ?12, manual_severity = ?13, user_login = ?14,
                    assignee_login = ?15, created_at = ?16, updated_at = ?17, closed_at = ?18,
                    data = ?19
                WHERE uuid = ?1
                "#,
            )?;

            for row in rows {
                let changed = stmt.execute(params![
                    row.uuid,
                    row.resource_id,
                    row.rule_id,
                    row.severity.map(|s| s.as_str()),
                    row.line,
                    row.title,
                    row.message,
                    row.cost,
                    row.resolution,
                    row.status.as_str(),
                    row.checksum,
                    row.manual_issue,
                    row.manual_severity,
                    row.user_login,
                    row.assignee_login,
                    row.created_at,
                    row.updated_at,
                    row.closed_at,
                    row.data,
                ])?;
                if changed == 0 {
                    return Err(Error::IssueNotFound(row.uuid.clone()));
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Get an issue row by uuid
    pub fn get_issue(&self, uuid: &str) -> Result<Option<IssueRow>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM issues WHERE uuid = ?1", ISSUE_COLUMNS),
                [uuid],
                |row| self.row_to_issue(row),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Select the issue rows matching a query, ordered by uuid
    pub fn select_issues(&self, query: &IssueQuery) -> Result<Vec<IssueRow>> {
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        let mut push_in = |column: &str, items: Vec<String>| {
            if items.is_empty() {
                return;
            }
            let placeholders: Vec<String> = items
                .into_iter()
                .map(|item| {
                    values.push(Value::Text(item));
                    format!("?{}", values.len())
                })
                .collect();
            clauses.push(format!("{} IN ({})", column, placeholders.join(", ")));
        };

        push_in("uuid", query.keys().to_vec());
        push_in(
            "severity",
            query.severities().iter().map(|s| s.as_str().to_string()).collect(),
        );
        push_in(
            "status",
            query.statuses().iter().map(|s| s.as_str().to_string()).collect(),
        );
        push_in("assignee_login", query.assignee_logins().to_vec());

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let limit = i64::try_from(query.limit())
            .map_err(|_| Error::InvalidQuery(format!("limit out of range: {}", query.limit())))?;
        let offset = i64::try_from(query.offset())
            .map_err(|_| Error::InvalidQuery(format!("offset out of range: {}", query.offset())))?;

        values.push(Value::Integer(limit));
        let limit_idx = values.len();
        values.push(Value::Integer(offset));
        let offset_idx = values.len();

        let sql = format!(
            "SELECT {} FROM issues {} ORDER BY uuid LIMIT ?{} OFFSET ?{}",
            ISSUE_COLUMNS, where_clause, limit_idx, offset_idx
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| self.row_to_issue(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    /// Count all issues
    pub fn count_issues(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Helper to convert a row to an IssueRow
    fn row_to_issue(&self, row: &rusqlite::Row) -> rusqlite::Result<IssueRow> {
        let severity: Option<String> = row.get(3)?;
        let status: String = row.get(9)?;

        let severity = severity
            .map(|s| s.parse::<Severity>())
            .transpose()
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
            })?;

        let status: IssueStatus = status.parse().map_err(|e: Error| {
            rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(IssueRow {
            uuid: row.get(0)?,
            resource_id: row.get(1)?,
            rule_id: row.get(2)?,
            severity,
            line: row.get(4)?,
            title: row.get(5)?,
            message: row.get(6)?,
            cost: row.get(7)?,
            resolution: row.get(8)?,
            status,
            checksum: row.get(10)?,
            manual_issue: row.get(11)?,
            manual_severity: row.get(12)?,
            user_login: row.get(13)?,
            assignee_login: row.get(14)?,
            created_at: row.get(15)?,
            updated_at: row.get(16)?,
            closed_at: row.get(17)?,
            data: row.get(18)?,
        })
    }

    // ========== Rule Operations ==========

    /// Insert a rule, or refresh name and severity of an existing one
    pub fn insert_rule(
        &self,
        repository_key: &str,
        rule_key: &str,
        name: Option<&str>,
        severity: Option<Severity>,
    ) -> Result<Rule> {
        self.conn.execute(
            r#"
            INSERT INTO rules (repository_key, rule_key, name, severity)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(repository_key, rule_key) DO UPDATE SET
                name = excluded.name,
                severity = excluded.severity
            "#,
            params![repository_key, rule_key, name, severity.map(|s| s.as_str())],
        )?;

        self.find_by_key(repository_key, rule_key)?
            .ok_or(Error::Storage(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Count all rules
    pub fn count_rules(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM rules", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Helper to convert a row to a Rule
    fn row_to_rule(&self, row: &rusqlite::Row) -> rusqlite::Result<Rule> {
        let severity: Option<String> = row.get(4)?;
        let severity = severity
            .map(|s| s.parse::<Severity>())
            .transpose()
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
            })?;

        Ok(Rule {
            id: row.get(0)?,
            repository_key: row.get(1)?,
            key: row.get(2)?,
            name: row.get(3)?,
            severity,
        })
    }

    // ========== Snapshot Operations ==========

    /// Register a snapshot for a component
    pub fn insert_snapshot(&self, component_key: &str, resource_id: i64) -> Result<Snapshot> {
        self.conn.execute(
            "INSERT INTO snapshots (component_key, resource_id) VALUES (?1, ?2)",
            params![component_key, resource_id],
        )?;
        Ok(Snapshot::new(self.conn.last_insert_rowid(), resource_id, component_key))
    }

    /// Load the latest snapshot of every component
    pub fn load_snapshots(&self) -> Result<SnapshotCache> {
        let mut stmt = self.conn.prepare(
            "SELECT id, resource_id, component_key FROM snapshots ORDER BY id"
        )?;

        let snapshots = stmt.query_map([], |row| {
            Ok(Snapshot {
                id: row.get(0)?,
                resource_id: row.get(1)?,
                component_key: row.get(2)?,
            })
        })?;

        let mut cache = SnapshotCache::new();
        for snapshot in snapshots {
            cache.put(snapshot?);
        }
        Ok(cache)
    }

    /// Count all snapshots
    pub fn count_snapshots(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM snapshots", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            issues: self.count_issues()?,
            rules: self.count_rules()?,
            snapshots: self.count_snapshots()?,
        })
    }
}

impl IssueWriter for SqliteStore {
    fn insert(&self, row: &IssueRow) -> Result<()> {
        self.insert_issue(row)
    }

    fn update(&self, rows: &[IssueRow]) -> Result<()> {
        self.update_issues(rows)
    }
}

impl RuleLookup for SqliteStore {
    fn find_by_key(&self, repository_key: &str, rule_key: &str) -> Result<Option<Rule>> {
        self.conn
            .query_row(
                "SELECT id, repository_key, rule_key, name, severity FROM rules WHERE repository_key = ?1 AND rule_key = ?2",
                [repository_key, rule_key],
                |row| self.row_to_rule(row),
            )
            .optional()
            .map_err(Into::into)
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub issues: usize,
    pub rules: usize,
    pub snapshots: usize,
}
