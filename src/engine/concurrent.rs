//! MiniDB - Concurrent Engine Handle
//! Thread-safe handle around the engine using Arc + RwLock.
//!
//! ## Concurrency Model
//! - **Read operations** (`get`, `len`, `contains_key`, ...) acquire a **read lock** (shared)
//! - **Write operations** (`put`, `delete`, `close`) acquire a **write lock** (exclusive)
//! - Append and index update happen under the same write lock, so a reader
//!   that sees an index entry always finds a fully written record behind it.
//!
//! No cross-process locking: two processes opening the same directory is unsupported.

use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::Config;
use crate::error::{MiniDbError, Result};
use crate::types::Value;

use super::metrics::EngineMetrics;
use super::{Engine, EngineState};

/// Cloneable, thread-safe handle to one MiniDB store.
///
/// ## Example
/// ```no_run
/// use minidb::MiniDb;
/// use std::thread;
///
/// let db = MiniDb::open_path("./data").unwrap();
///
/// let writer = db.clone();
/// thread::spawn(move || {
///     writer.put(b"key", b"value").unwrap();
/// })
/// .join()
/// .unwrap();
///
/// assert_eq!(db.get(b"key").unwrap(), Some(b"value".to_vec()));
/// ```
#[derive(Clone)]
pub struct MiniDb {
    inner: Arc<RwLock<Engine>>,
}

impl MiniDb {
    /// Open or create a store and rebuild its index. The rebuild runs
    /// before the handle exists, so nothing can observe a partial index.
    pub fn open(config: Config) -> Result<Self> {
        let engine = Engine::open(config)?;
        Ok(Self {
            inner: Arc::new(RwLock::new(engine)),
        })
    }

    /// Open with default settings in `dir`.
    pub fn open_path(dir: impl AsRef<Path>) -> Result<Self> {
        Self::open(Config::new(dir.as_ref()))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Engine>> {
        self.inner
            .read()
            .map_err(|e| MiniDbError::LockPoisoned(format!("engine lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Engine>> {
        self.inner
            .write()
            .map_err(|e| MiniDbError::LockPoisoned(format!("engine lock poisoned: {}", e)))
    }

    /// Insert or overwrite a key (write lock). Empty keys are ignored.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.write()?.put(key, value)
    }

    /// Get the latest value for a key (read lock).
    pub fn get(&self, key: &[u8]) -> Result<Option<Value>> {
        self.read()?.get(key)
    }

    /// Delete a key (write lock). Empty or absent keys are ignored.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.write()?.delete(key)
    }

    /// Number of live keys (read lock).
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Whether a key currently has a value (read lock).
    pub fn contains_key(&self, key: &[u8]) -> Result<bool> {
        Ok(self.read()?.contains_key(key))
    }

    /// Byte length of the log (read lock).
    pub fn log_size(&self) -> Result<u64> {
        Ok(self.read()?.log_size())
    }

    pub fn state(&self) -> Result<EngineState> {
        Ok(self.read()?.state())
    }

    /// Force written records to disk (write lock, so no append is in flight).
    pub fn sync(&self) -> Result<()> {
        self.write()?.sync()
    }

    /// Close the store for every clone of this handle.
    pub fn close(&self) -> Result<()> {
        self.write()?.close()
    }

    /// Summary of the log and its counters (read lock).
    pub fn report(&self) -> Result<String> {
        Ok(self.read()?.report())
    }

    /// Run `f` against the engine metrics (read lock).
    pub fn with_metrics<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&EngineMetrics) -> R,
    {
        let engine = self.read()?;
        Ok(f(engine.metrics()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn temp_db() -> (tempfile::TempDir, MiniDb) {
        let dir = tempfile::tempdir().unwrap();
        let db = MiniDb::open(Config::new(dir.path())).unwrap();
        (dir, db)
    }

    #[test]
    fn test_concurrent_put_get() {
        let (_dir, db) = temp_db();

        db.put(b"test", b"value").unwrap();
        assert_eq!(db.get(b"test").unwrap(), Some(b"value".to_vec()));
    }

    #[test]
    fn test_clone_and_share() {
        let (_dir, db) = temp_db();

        let db_clone = db.clone();
        db_clone.put(b"shared", b"data").unwrap();

        assert_eq!(db.get(b"shared").unwrap(), Some(b"data".to_vec()));
    }

    #[test]
    fn test_multiple_concurrent_reads() {
        let (_dir, db) = temp_db();
        db.put(b"key", b"value").unwrap();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let db = db.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        assert_eq!(db.get(b"key").unwrap(), Some(b"value".to_vec()));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_concurrent_writers() {
        let (_dir, db) = temp_db();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let db = db.clone();
                thread::spawn(move || {
                    for j in 0..50 {
                        let key = format!("key_{}_{}", i, j).into_bytes();
                        let value = format!("value_{}_{}", i, j).into_bytes();
                        db.put(&key, &value).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(db.len().unwrap(), 400);
        assert_eq!(db.get(b"key_7_49").unwrap(), Some(b"value_7_49".to_vec()));
    }

    #[test]
    fn test_readers_never_see_unwritten_records() {
        let (_dir, db) = temp_db();

        let writer = {
            let db = db.clone();
            thread::spawn(move || {
                for i in 0..200 {
                    let key = format!("k{}", i).into_bytes();
                    db.put(&key, &vec![i as u8; 64]).unwrap();
                    if i % 3 == 0 {
                        db.delete(&key).unwrap();
                    }
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let db = db.clone();
                thread::spawn(move || {
                    for i in 0..200 {
                        let key = format!("k{}", i).into_bytes();
                        if let Some(value) = db.get(&key).unwrap() {
                            assert_eq!(value, vec![i as u8; 64]);
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }

        assert_eq!(db.len().unwrap(), 133);
    }

    #[test]
    fn test_close_applies_to_all_clones() {
        let (_dir, db) = temp_db();
        let other = db.clone();
        db.put(b"a", b"1").unwrap();

        db.close().unwrap();

        assert_eq!(other.state().unwrap(), EngineState::Closed);
        assert!(matches!(other.get(b"a"), Err(MiniDbError::Closed)));
    }

    #[test]
    fn test_metrics_access() {
        let (_dir, db) = temp_db();
        db.put(b"test", b"value").unwrap();
        db.get(b"test").unwrap();

        let total = db.with_metrics(|metrics| metrics.total_ops()).unwrap();
        assert_eq!(total, 2);
    }
}
