// Store location and backend selection

use crate::storage::{FileStorage, SqliteStorage};
use crate::store::Store;
use eyre::Result;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

pub const APP_DIR: &str = "shadowwatch";
pub const DB_FILE: &str = "shadowwatch.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// `<key>.json` files in the store directory
    #[default]
    File,
    /// A single SQLite database in the store directory
    Sqlite,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(Backend::File),
            "sqlite" => Ok(Backend::Sqlite),
            other => Err(format!("unknown backend: {} (expected file or sqlite)", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub backend: Backend,
}

impl StoreConfig {
    pub fn new(path: Option<PathBuf>, backend: Backend) -> Self {
        Self {
            path: path.unwrap_or_else(default_store_path),
            backend,
        }
    }

    /// Open the configured backend and wrap it in a store
    pub fn open(&self) -> Result<Store> {
        debug!(path = ?self.path, backend = ?self.backend, "Opening store");
        let store = match self.backend {
            Backend::File => Store::new(FileStorage::open(&self.path)?),
            Backend::Sqlite => Store::new(SqliteStorage::open(self.path.join(DB_FILE))?),
        };
        Ok(store)
    }
}

/// Platform data directory joined with `shadowwatch`, or `.` if there is none
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CrimeType, NewReport};
    use tempfile::TempDir;

    fn report() -> NewReport {
        NewReport {
            report_details: "Shop window smashed overnight".to_string(),
            crime_type: CrimeType::Theft,
            latitude: 23.6,
            longitude: 58.5,
        }
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("file".parse::<Backend>().unwrap(), Backend::File);
        assert_eq!("SQLite".parse::<Backend>().unwrap(), Backend::Sqlite);
        assert!("redis".parse::<Backend>().is_err());
    }

    #[test]
    fn test_default_path_ends_with_app_dir() {
        let path = default_store_path();
        assert!(path.ends_with(APP_DIR) || path == PathBuf::from("."));
        assert_eq!(StoreConfig::new(None, Backend::File).path, path);
    }

    #[test]
    fn test_open_file_backend() {
        let temp = TempDir::new().unwrap();
        let config = StoreConfig::new(Some(temp.path().to_path_buf()), Backend::File);

        config.open().unwrap().submit(report()).unwrap().unwrap();
        assert!(temp.path().join("crimes.json").exists());
        assert_eq!(config.open().unwrap().get_all().len(), 1);
    }

    #[test]
    fn test_open_sqlite_backend() {
        let temp = TempDir::new().unwrap();
        let config = StoreConfig::new(Some(temp.path().join("nested")), Backend::Sqlite);

        config.open().unwrap().submit(report()).unwrap().unwrap();
        assert!(temp.path().join("nested").join(DB_FILE).exists());
        assert_eq!(config.open().unwrap().get_all().len(), 1);
    }
}
