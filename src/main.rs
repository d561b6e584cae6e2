//! Issuesync CLI - persist scan issues into a SQLite store

use clap::{Parser, Subcommand};
use issuesync::config::{self, IssuesyncConfig};
use issuesync::report::ScanReport;
use issuesync::storage::SqliteStore;
use issuesync::ui::{self, Icons};
use issuesync::{IssueQuery, IssueStatus, IssueSynchronizer, Severity};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "issuesync")]
#[command(version)]
#[command(about = "Persist the issues of a code analysis scan into a SQLite store")]
#[command(long_about = r#"
Issuesync takes the issues raised during a scan and reconciles them with
the issue store: new issues are inserted, carried-over issues are updated.

Example usage:
  issuesync rules --file rules.json
  issuesync sync --report scan.json
  issuesync list --severity BLOCKER --status OPEN
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Import rule definitions from a JSON file
    Rules {
        /// JSON array of rules
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Persist the issues of a scan report
    Sync {
        /// Scan report (defaults to the config file's `report`)
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// List persisted issues
    List {
        /// Issue keys
        #[arg(short, long)]
        key: Vec<String>,

        /// Severities (INFO, MINOR, MAJOR, CRITICAL, BLOCKER)
        #[arg(short, long)]
        severity: Vec<String>,

        /// Statuses (OPEN, REOPENED, RESOLVED, CLOSED)
        #[arg(long)]
        status: Vec<String>,

        /// Assignee logins
        #[arg(short, long)]
        assignee: Vec<String>,

        /// Maximum number of results
        #[arg(short, long, default_value = "100")]
        limit: usize,

        /// Number of results to skip
        #[arg(long, default_value = "0")]
        offset: usize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show statistics about the store
    Stats,
}

#[derive(Debug, Deserialize)]
struct RuleDefinition {
    repository_key: String,
    key: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    severity: Option<Severity>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let loaded = config::load_config(Some(&config_path))?;
    let database = config::resolve_database_path(cli.database.clone(), loaded.as_ref());

    match cli.command {
        Commands::Init { force } => {
            let config = IssuesyncConfig {
                database: Some(database.to_string_lossy().to_string()),
                report: None,
            };
            config::write_config(&config_path, &config, force)?;
            ui::success(&format!("Wrote config to {}", config_path.display()));
        }

        Commands::Rules { file } => {
            let store = open_store(&database)?;
            let contents = std::fs::read_to_string(&file)?;
            let rules: Vec<RuleDefinition> = serde_json::from_str(&contents)?;

            tracing::info!("Importing {} rules from {}", rules.len(), file.display());
            for rule in &rules {
                store.insert_rule(&rule.repository_key, &rule.key, rule.name.as_deref(), rule.severity)?;
            }
            ui::success(&format!("Imported {} rules", rules.len()));
        }

        Commands::Sync { report } => {
            let report_path = report
                .or_else(|| loaded.as_ref().and_then(|c| c.report.as_ref()).map(PathBuf::from))
                .ok_or_else(|| anyhow::anyhow!("no scan report given (use --report or set `report` in the config)"))?;

            ui::header(&format!("Syncing issues from {}", report_path.display()));
            ui::info("Database", &database.display().to_string());

            let store = open_store(&database)?;
            let (components, cache) = ScanReport::load(&report_path)?.into_parts();
            if cache.is_empty() {
                ui::warn("Scan report contains no issues");
            }

            // Register the components of this scan before persisting their issues
            for component in &components {
                store.insert_snapshot(&component.component_key, component.resource_id)?;
            }
            let snapshots = store.load_snapshots()?;

            let stats = match IssueSynchronizer::new(&cache, &snapshots, &store, &store).synchronize() {
                Ok(stats) => stats,
                Err(e) => {
                    if e.is_missing_dependency() {
                        ui::error("Scan report references unregistered data; nothing after the failing issue was written");
                    }
                    return Err(e.into());
                }
            };

            let inserted = stats.inserted.to_string();
            let updated = stats.updated.to_string();
            let total = stats.total().to_string();
            println!(
                "{}",
                ui::stats_table(&[
                    ("Inserted", inserted.as_str()),
                    ("Updated", updated.as_str()),
                    ("Total", total.as_str()),
                ])
            );
            ui::success("Sync complete");
        }

        Commands::List { key, severity, status, assignee, limit, offset, format } => {
            let store = open_store(&database)?;

            let severities = severity
                .iter()
                .map(|s| Severity::from_str(s))
                .collect::<issuesync::Result<Vec<_>>>()?;
            let statuses = status
                .iter()
                .map(|s| IssueStatus::from_str(s))
                .collect::<issuesync::Result<Vec<_>>>()?;

            let query = IssueQuery::builder()
                .keys(key)
                .severities(severities)
                .statuses(statuses)
                .assignee_logins(assignee)
                .limit(limit)
                .offset(offset)
                .build()?;

            let issues = store.select_issues(&query)?;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&issues)?);
            } else if issues.is_empty() {
                println!("{} No issues found.", Icons::EMPTY);
            } else {
                println!("{}", ui::issue_table(&issues));
                ui::summary_row("Shown:", &issues.len().to_string());
            }
        }

        Commands::Stats => {
            let store = open_store(&database)?;
            let stats = store.stats()?;

            ui::section(&format!("{} Issuesync Statistics", Icons::STATS));
            let issues = stats.issues.to_string();
            let rules = stats.rules.to_string();
            let snapshots = stats.snapshots.to_string();
            println!(
                "{}",
                ui::stats_table(&[
                    ("Issues", issues.as_str()),
                    ("Rules", rules.as_str()),
                    ("Snapshots", snapshots.as_str()),
                ])
            );
            println!("{}", ui::dim(&format!("Database: {}", database.display())));
        }
    }

    Ok(())
}

fn open_store(database: &Path) -> anyhow::Result<SqliteStore> {
    config::ensure_db_dir(database)?;
    Ok(SqliteStore::open(database)?)
}
