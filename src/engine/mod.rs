//! MiniDB - Storage Engine Module
//! Ties the record codec and the log store to the in-memory index.

pub mod concurrent;
pub mod log_store;
pub mod metrics;
pub mod record;

use std::collections::HashMap;
use std::path::Path;

use crate::config::Config;
use crate::error::{MiniDbError, Result};
use crate::types::{Key, Offset, Value};

use self::log_store::LogStore;
use self::metrics::EngineMetrics;
use self::record::{encode, RecordKind, HEADER_SIZE};

/// Lifecycle of an engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// The index is being rebuilt from the log.
    Opening,
    /// Serving reads and writes.
    Ready,
    /// Closed; every operation fails with `MiniDbError::Closed`.
    Closed,
}

/// The core MiniDB storage engine.
///
/// Owns the log store and a hash index mapping each live key to the offset
/// of its most recent `PUT` record. Writes take `&mut self` and reads take
/// `&self`; wrap it in [`concurrent::MiniDb`] to share it between threads.
pub struct Engine {
    /// Append-only data file.
    store: LogStore,
    /// Key -> offset of the latest put record. Deleted keys are absent.
    index: HashMap<Key, Offset>,
    state: EngineState,
    metrics: EngineMetrics,
    /// Engine configuration.
    config: Config,
}

impl Engine {
    /// Open or create a store in the configured directory and rebuild
    /// the index by replaying the whole log.
    pub fn open(config: Config) -> Result<Self> {
        config.ensure_dirs()?;
        let store = LogStore::open(config.data_file_path(), config.sync_writes)?;

        let mut engine = Self {
            store,
            index: HashMap::new(),
            state: EngineState::Opening,
            metrics: EngineMetrics::new(),
            config,
        };
        let replayed = engine.rebuild_index()?;
        engine.state = EngineState::Ready;

        log::info!(
            "MiniDB opened at {:?} ({} records replayed, {} live keys, {} bytes)",
            engine.config.data_dir,
            replayed,
            engine.index.len(),
            engine.store.len()
        );
        Ok(engine)
    }

    /// Open with default settings in `dir`.
    pub fn open_path(dir: impl AsRef<Path>) -> Result<Self> {
        Self::open(Config::new(dir.as_ref()))
    }

    /// Scan the log from offset 0, applying every record to a fresh index.
    /// Stops cleanly at end of log; any other failure aborts the open.
    fn rebuild_index(&mut self) -> Result<u64> {
        self.index.clear();
        let mut offset: Offset = 0;
        let mut replayed = 0u64;

        loop {
            let record = match self.store.read_at(offset) {
                Ok(record) => record,
                Err(err) if err.is_end_of_log() => break,
                Err(err) => {
                    log::error!(
                        "index rebuild of {:?} failed at offset {}: {}",
                        self.store.path(),
                        offset,
                        err
                    );
                    return Err(err);
                }
            };

            let record_len = record.encoded_len();
            match record.kind {
                RecordKind::Put => {
                    self.index.insert(record.key, offset);
                }
                RecordKind::Delete => {
                    self.index.remove(&record.key);
                }
            }
            offset += record_len;
            replayed += 1;
        }

        self.metrics.record_replay(replayed);
        Ok(replayed)
    }

    /// Store `value` under `key`. An empty key is ignored.
    /// The index is only updated once the record is appended.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.ensure_ready()?;
        if key.is_empty() {
            return Ok(());
        }

        let bytes = encode(key, value, RecordKind::Put)?;
        let offset = self.store.append(&bytes)?;
        self.index.insert(key.to_vec(), offset);

        self.metrics.record_put(bytes.len() as u64);
        log::debug!("put {} bytes at offset {}", bytes.len(), offset);
        Ok(())
    }

    /// Look up the latest value for `key`. An empty key is never found.
    pub fn get(&self, key: &[u8]) -> Result<Option<Value>> {
        self.ensure_ready()?;
        if key.is_empty() {
            return Ok(None);
        }

        let offset = match self.index.get(key) {
            Some(&offset) => offset,
            None => {
                self.metrics.record_get(None);
                return Ok(None);
            }
        };

        let record = match self.store.read_at(offset) {
            Ok(record) => record,
            // The index pointed past the end of the log.
            Err(MiniDbError::EndOfLog(at)) => {
                return Err(MiniDbError::TruncatedRecord {
                    offset: at,
                    expected: HEADER_SIZE as u64,
                    available: 0,
                })
            }
            Err(err) => return Err(err),
        };
        if record.is_tombstone() {
            return Err(MiniDbError::UnexpectedTombstone(offset));
        }
        self.metrics.record_get(Some(record.value.len()));
        Ok(Some(record.value))
    }

    /// Delete `key` by appending a tombstone.
    /// Empty keys and keys not in the index are ignored and write nothing.
    pub fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.ensure_ready()?;
        if key.is_empty() || !self.index.contains_key(key) {
            return Ok(());
        }

        let bytes = encode(key, &[], RecordKind::Delete)?;
        let offset = self.store.append(&bytes)?;
        self.index.remove(key);

        self.metrics.record_delete(bytes.len() as u64);
        log::debug!("delete tombstone at offset {}", offset);
        Ok(())
    }

    /// Force written records to the storage device.
    pub fn sync(&self) -> Result<()> {
        self.ensure_ready()?;
        self.store.sync()
    }

    /// Sync the log and move to `Closed`. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.state == EngineState::Closed {
            return Ok(());
        }
        self.store.sync()?;
        self.state = EngineState::Closed;
        log::info!("MiniDB at {:?} closed", self.config.data_dir);
        Ok(())
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.state {
            EngineState::Ready => Ok(()),
            EngineState::Opening | EngineState::Closed => Err(MiniDbError::Closed),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Whether `key` currently has a value.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.index.contains_key(key)
    }

    /// Byte length of the log, i.e. the offset of the next record.
    pub fn log_size(&self) -> u64 {
        self.store.len()
    }

    /// Path of the data file.
    pub fn data_file_path(&self) -> &Path {
        self.store.path()
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Human-readable summary of the log and its counters.
    pub fn report(&self) -> String {
        self.metrics.report(self.index.len(), self.store.len())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
