use crate::storage::IssueRow;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn stats_table(stats: &[(&str, &str)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

#[derive(Tabled)]
struct IssueLine {
    #[tabled(rename = "Key")]
    uuid: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Line")]
    line: String,
    #[tabled(rename = "Assignee")]
    assignee: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl From<&IssueRow> for IssueLine {
    fn from(row: &IssueRow) -> Self {
        Self {
            uuid: row.uuid.clone(),
            severity: row.severity.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
            status: row.status.to_string(),
            line: row.line.map(|l| l.to_string()).unwrap_or_else(|| "-".to_string()),
            assignee: row.assignee_login.clone().unwrap_or_else(|| "-".to_string()),
            message: row.message.clone().unwrap_or_default(),
        }
    }
}

pub fn issue_table(rows: &[IssueRow]) -> String {
    let lines: Vec<IssueLine> = rows.iter().map(IssueLine::from).collect();
    Table::new(lines).with(Style::rounded()).to_string()
}
