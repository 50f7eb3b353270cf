//! MiniDB - Engine Metrics
//! Atomic operation counters, updated without taking the engine's
//! write lock so `get` can record under a shared read lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Atomic operation counters for the MiniDB engine.
///
/// All counters use `Ordering::Relaxed`; they are for observation only.
#[derive(Debug)]
pub struct EngineMetrics {
    /// Number of records appended by `put`.
    pub puts: AtomicU64,
    /// Number of `get` calls that reached the index.
    pub gets: AtomicU64,
    /// Number of tombstones appended by `delete`.
    pub deletes: AtomicU64,
    /// Total record bytes appended to the log (headers included).
    pub bytes_written: AtomicU64,
    /// Total value bytes returned by `get`.
    pub bytes_read: AtomicU64,
    /// Records scanned by the index rebuild on open.
    pub records_replayed: AtomicU64,
    opened_at: Instant,
}

impl EngineMetrics {
    /// Create a new metrics instance with all counters at zero.
    pub fn new() -> Self {
        Self {
            puts: AtomicU64::new(0),
            gets: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
            records_replayed: AtomicU64::new(0),
            opened_at: Instant::now(),
        }
    }

    /// Record an appended put record of `record_len` bytes.
    pub fn record_put(&self, record_len: u64) {
        self.puts.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(record_len, Ordering::Relaxed);
    }

    /// Record a get; `value_size` is `None` on a miss.
    pub fn record_get(&self, value_size: Option<usize>) {
        self.gets.fetch_add(1, Ordering::Relaxed);
        if let Some(size) = value_size {
            self.bytes_read.fetch_add(size as u64, Ordering::Relaxed);
        }
    }

    /// Record an appended tombstone of `record_len` bytes.
    pub fn record_delete(&self, record_len: u64) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(record_len, Ordering::Relaxed);
    }

    /// Record the number of records scanned during rebuild.
    pub fn record_replay(&self, records: u64) {
        self.records_replayed.fetch_add(records, Ordering::Relaxed);
    }

    /// Time since the engine finished opening.
    pub fn uptime(&self) -> Duration {
        self.opened_at.elapsed()
    }

    /// Get total number of operations (puts + gets + deletes).
    pub fn total_ops(&self) -> u64 {
        self.puts.load(Ordering::Relaxed)
            + self.gets.load(Ordering::Relaxed)
            + self.deletes.load(Ordering::Relaxed)
    }

    /// Summarise the log and the traffic it has seen.
    /// `live_keys` and `log_size` come from the engine, which owns the index and file.
    pub fn report(&self, live_keys: usize, log_size: u64) -> String {
        let appended = self.puts.load(Ordering::Relaxed) + self.deletes.load(Ordering::Relaxed);
        format!(
            "log: {} bytes, {} live keys\n\
             replayed on open: {} records\n\
             appended: {} records ({} put, {} tombstone), {} bytes\n\
             lookups: {}, {} value bytes returned\n\
             open for {:?}",
            log_size,
            live_keys,
            self.records_replayed.load(Ordering::Relaxed),
            appended,
            self.puts.load(Ordering::Relaxed),
            self.deletes.load(Ordering::Relaxed),
            self.bytes_written.load(Ordering::Relaxed),
            self.gets.load(Ordering::Relaxed),
            self.bytes_read.load(Ordering::Relaxed),
            self.uptime(),
        )
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_operations() {
        let m = EngineMetrics::new();

        m.record_put(15);
        m.record_put(12);
        m.record_get(Some(5));
        m.record_get(None);
        m.record_delete(13);
        m.record_replay(4);

        assert_eq!(m.puts.load(Ordering::Relaxed), 2);
        assert_eq!(m.gets.load(Ordering::Relaxed), 2);
        assert_eq!(m.deletes.load(Ordering::Relaxed), 1);
        assert_eq!(m.bytes_written.load(Ordering::Relaxed), 40);
        assert_eq!(m.bytes_read.load(Ordering::Relaxed), 5);
        assert_eq!(m.records_replayed.load(Ordering::Relaxed), 4);
        assert_eq!(m.total_ops(), 5);
    }

    #[test]
    fn test_report_describes_log() {
        let m = EngineMetrics::new();
        m.record_replay(3);
        m.record_put(20);
        m.record_delete(13);
        m.record_get(Some(4));

        let report = m.report(2, 120);
        assert!(report.contains("log: 120 bytes, 2 live keys"));
        assert!(report.contains("replayed on open: 3 records"));
        assert!(report.contains("appended: 2 records (1 put, 1 tombstone), 33 bytes"));
        assert!(report.contains("lookups: 1, 4 value bytes returned"));
    }

    #[test]
    fn test_default() {
        let m = EngineMetrics::default();
        assert_eq!(m.total_ops(), 0);
    }
}
