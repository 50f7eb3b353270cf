//! MiniDB - Append-Only Log Key-Value Store
//!
//! An embedded key-value store that appends every write to a single log
//! file and keeps an in-memory hash index from key to the offset of its
//! latest record.
//!
//! ## Features
//! - **Record log**: fixed 10-byte big-endian header followed by key and value
//! - **Hash index**: rebuilt on open by replaying the whole log
//! - **Tombstones**: deletes append a record so a replay reproduces them
//! - **Concurrency**: many readers or one writer through an `RwLock`
//! - **Metrics**: lock-free atomic counters
//!
//! ## Example
//! ```no_run
//! let db = minidb::open("./data").unwrap();
//!
//! db.put(b"key", b"value").unwrap();
//! assert_eq!(db.get(b"key").unwrap(), Some(b"value".to_vec()));
//!
//! db.delete(b"key").unwrap();
//! assert_eq!(db.get(b"key").unwrap(), None);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod types;

use std::path::Path;

pub use config::Config;
pub use engine::concurrent::MiniDb;
pub use engine::{Engine, EngineState};
pub use error::{MiniDbError, Result};

/// Open or create the store in `dir`, creating the directory if absent.
pub fn open(dir: impl AsRef<Path>) -> Result<MiniDb> {
    MiniDb::open_path(dir)
}
