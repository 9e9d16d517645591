//! Projects and the location of the reporting database.
//!
//! A project owns tasks. The database file defaults to
//! `~/.crmr/reporting.json` unless `--db` (or `CRMR_DB`) names another path.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_DIR: &str = ".crmr";
pub const DEFAULT_DB_FILE: &str = "reporting.json";

/// A project that tasks belong to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Project {
    pub fn new(id: u64, title: &str) -> Self {
        Project {
            id,
            title: title.trim().to_string(),
            description: None,
        }
    }
}

/// Directory holding the default database, under `$HOME` or the working directory.
pub fn default_data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(DEFAULT_DIR)
}

/// Resolve the database path, creating its parent directory if needed.
pub fn resolve_db_path(explicit: Option<&Path>) -> Result<PathBuf, std::io::Error> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => default_data_dir().join(DEFAULT_DB_FILE),
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_title_is_trimmed() {
        assert_eq!(Project::new(1, "  Website relaunch ").title, "Website relaunch");
    }

    #[test]
    fn test_resolve_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("db.json");
        let resolved = resolve_db_path(Some(&path)).unwrap();
        assert_eq!(resolved, path);
        assert!(dir.path().join("nested").is_dir());
    }
}
