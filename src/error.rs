//! MiniDB - Error Types
//! Defines the error hierarchy for the log-structured store.

use thiserror::Error;

/// Custom Result type for MiniDB.
pub type Result<T> = std::result::Result<T, MiniDbError>;

/// Error types for the MiniDB storage engine.
#[derive(Error, Debug)]
pub enum MiniDbError {
    /// I/O errors from creating, opening, reading or writing the data file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The bytes at a record boundary do not form a valid header.
    #[error("Malformed record header: {0}")]
    MalformedHeader(String),

    /// A record declares more bytes than the log holds.
    #[error("Truncated record at offset {offset}: expected {expected} bytes, {available} available")]
    TruncatedRecord {
        offset: u64,
        expected: u64,
        available: u64,
    },

    /// No record starts at or beyond this offset. Replay uses it as its stop signal.
    #[error("End of log at offset {0}")]
    EndOfLog(u64),

    /// Key or value length does not fit the 32-bit size fields.
    #[error("Record too large: key {key_len} bytes, value {value_len} bytes")]
    RecordTooLarge { key_len: usize, value_len: usize },

    /// The index resolved to a delete record.
    #[error("Index points at a tombstone at offset {0}")]
    UnexpectedTombstone(u64),

    /// The engine has been closed.
    #[error("Engine is closed")]
    Closed,

    /// A writer panicked while holding the engine lock.
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl MiniDbError {
    /// Returns true for the end-of-log sentinel.
    pub fn is_end_of_log(&self) -> bool {
        matches!(self, MiniDbError::EndOfLog(_))
    }
}
