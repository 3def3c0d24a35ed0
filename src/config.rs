// Storage configuration - passed explicitly to Database::open

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable the binaries read the store location from.
pub const DB_PATH_ENV: &str = "POCKET_LEDGER_DB";

/// Store file used when nothing else is configured (next to the binary's cwd).
pub const DEFAULT_DB_FILE: &str = "ledger.db";

const MEMORY_PATH: &str = ":memory:";

#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// SQLite file location, or `:memory:` for a private in-memory store
    pub path: PathBuf,

    /// Enable WAL journal mode for crash recovery
    pub wal: bool,

    /// How long to wait on a lock held by another process
    pub busy_timeout_ms: u64,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StoreConfig {
            path: path.into(),
            wal: true,
            busy_timeout_ms: 5_000,
        }
    }

    /// Isolated store that lives as long as its `Database`.
    pub fn in_memory() -> Self {
        StoreConfig {
            path: PathBuf::from(MEMORY_PATH),
            wal: false,
            busy_timeout_ms: 0,
        }
    }

    /// Reads `POCKET_LEDGER_DB`, falling back to `ledger.db`.
    pub fn from_env() -> Self {
        match env::var(DB_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => StoreConfig::new(path.trim()),
            _ => StoreConfig::new(DEFAULT_DB_FILE),
        }
    }

    pub fn with_wal(mut self, wal: bool) -> Self {
        self.wal = wal;
        self
    }

    pub fn with_busy_timeout_ms(mut self, ms: u64) -> Self {
        self.busy_timeout_ms = ms;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.path == Path::new(MEMORY_PATH)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::new(DEFAULT_DB_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_config() {
        let config = StoreConfig::in_memory();
        assert!(config.is_in_memory());
        assert!(!config.wal);
    }

    #[test]
    fn test_builder_overrides() {
        let config = StoreConfig::new("/tmp/books.db")
            .with_wal(false)
            .with_busy_timeout_ms(250);

        assert_eq!(config.path, PathBuf::from("/tmp/books.db"));
        assert!(!config.wal);
        assert_eq!(config.busy_timeout_ms, 250);
        assert!(!config.is_in_memory());
    }

    #[test]
    fn test_default_points_at_ledger_file() {
        assert_eq!(StoreConfig::default().path, PathBuf::from(DEFAULT_DB_FILE));
    }
}
