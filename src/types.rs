//! MiniDB - Core Type Definitions

/// Key type. Arbitrary non-empty bytes.
pub type Key = Vec<u8>;

/// Value type. Arbitrary bytes, possibly empty.
pub type Value = Vec<u8>;

/// Byte position of a record in the data file.
pub type Offset = u64;
