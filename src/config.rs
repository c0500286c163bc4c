//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;

use anyhow::Result;

use crate::db::DEFAULT_STORAGE_KEY;

const APP_NAME: &str = "swapbind";
const DB_FILE: &str = "swapbind.db";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// SQLite database holding the durable key-value record
    /// (from SWAPBIND_DB).
    pub db_path: Option<PathBuf>,
    /// Key the binding set is stored under (from SWAPBIND_STORAGE_KEY).
    pub storage_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = lookup("SWAPBIND_DB")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let storage_key = lookup("SWAPBIND_STORAGE_KEY")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());

        Self {
            db_path,
            storage_key,
        }
    }

    /// Apply a command-line override for the database path.
    pub fn with_db_path(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.db_path = path;
        }
        self
    }

    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        match &self.db_path {
            Some(path) => Ok(path.clone()),
            None => default_db_path(),
        }
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", APP_NAME)
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join(DB_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config, Config::default());
        assert_eq!(config.storage_key, "component-bindings");
    }

    #[test]
    fn reads_overrides_and_ignores_blank_values() {
        let config = Config::from_lookup(lookup(&[
            ("SWAPBIND_DB", "/tmp/bindings.db"),
            ("SWAPBIND_STORAGE_KEY", "   "),
        ]));
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/bindings.db")));
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn cli_path_wins_over_env() {
        let config = Config::from_lookup(lookup(&[("SWAPBIND_DB", "/tmp/a.db")]))
            .with_db_path(Some(PathBuf::from("/tmp/b.db")));
        assert_eq!(config.resolved_db_path().unwrap(), PathBuf::from("/tmp/b.db"));

        let unchanged = config.clone().with_db_path(None);
        assert_eq!(unchanged, config);
    }
}
