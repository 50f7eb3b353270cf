//! MiniDB - Engine Configuration
//! Defines the location of the store and its write durability.

use std::path::PathBuf;

/// Name of the single data file kept in every store directory.
pub const DATA_FILE_NAME: &str = "minidb.data";

/// Configuration for the MiniDB storage engine.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the data file. Created on open if absent.
    pub data_dir: PathBuf,

    /// Whether to `sync_data` the file after every appended record.
    /// Off by default: appends reach the OS write path but are not forced to disk.
    pub sync_writes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./minidb"),
            sync_writes: false,
        }
    }
}

impl Config {
    /// Create a new Config with a custom data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Enable or disable a sync after each appended record.
    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    /// Path of the data file inside `data_dir`.
    pub fn data_file_path(&self) -> PathBuf {
        self.data_dir.join(DATA_FILE_NAME)
    }

    /// Ensure the data directory exists.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.data_dir, PathBuf::from("./minidb"));
        assert!(!config.sync_writes);
    }

    #[test]
    fn test_data_file_path() {
        let config = Config::new("/tmp/store").with_sync_writes(true);
        assert_eq!(config.data_file_path(), PathBuf::from("/tmp/store/minidb.data"));
        assert!(config.sync_writes);
    }

    #[test]
    fn test_ensure_dirs_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path().join("a").join("b"));
        config.ensure_dirs().unwrap();
        assert!(config.data_dir.is_dir());
    }
}
