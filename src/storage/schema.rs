//! Database schema definitions

/// SQL to create the issues table
pub const CREATE_ISSUES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS issues (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT NOT NULL UNIQUE,
    resource_id INTEGER NOT NULL,
    rule_id INTEGER NOT NULL,
    severity TEXT,
    line INTEGER,
    title TEXT,
    message TEXT,
    cost REAL,
    resolution TEXT,
    status TEXT NOT NULL,
    checksum TEXT,
    manual_issue INTEGER NOT NULL DEFAULT 0,
    manual_severity INTEGER NOT NULL DEFAULT 0,
    user_login TEXT,
    assignee_login TEXT,
    created_at TEXT,
    updated_at TEXT,
    closed_at TEXT,
    data TEXT
)
"#;

/// SQL to create the rules table
pub const CREATE_RULES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS rules (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repository_key TEXT NOT NULL,
    rule_key TEXT NOT NULL,
    name TEXT,
    severity TEXT,
    UNIQUE(repository_key, rule_key)
)
"#;

/// SQL to create the snapshots table
/// One row per component registration; the latest row wins on load
pub const CREATE_SNAPSHOTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS snapshots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    component_key TEXT NOT NULL,
    resource_id INTEGER NOT NULL
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_issues_resource ON issues(resource_id)",
    "CREATE INDEX IF NOT EXISTS idx_issues_rule ON issues(rule_id)",
    "CREATE INDEX IF NOT EXISTS idx_issues_status ON issues(status)",
    "CREATE INDEX IF NOT EXISTS idx_issues_assignee ON issues(assignee_login)",
    "CREATE INDEX IF NOT EXISTS idx_snapshots_component ON snapshots(component_key)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_ISSUES_TABLE,
        CREATE_RULES_TABLE,
        CREATE_SNAPSHOTS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
