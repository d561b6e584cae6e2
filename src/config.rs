use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IssuesyncConfig {
    pub database: Option<String>,
    /// Default scan report for `sync`
    pub report: Option<String>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("issuesync.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".issuesync").join("issues.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<IssuesyncConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: IssuesyncConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &IssuesyncConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Resolve the database path: explicit flag, then config, then default
pub fn resolve_database_path(flag: Option<PathBuf>, config: Option<&IssuesyncConfig>) -> PathBuf {
    flag.or_else(|| config.and_then(|c| c.database.as_ref()).map(PathBuf::from))
        .unwrap_or_else(|| default_database_path_in(Path::new(".")))
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
