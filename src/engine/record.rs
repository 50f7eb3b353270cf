//! MiniDB - Record Codec
//! Converts between a logical (key, value, kind) triple and the
//! byte layout of a single log record.
//!
//! ## Binary Format (per record)
//! ```text
//! [key_size: u32 BE][value_size: u32 BE][kind: u16 BE][key: key_size bytes][value: value_size bytes]
//! ```
//! The 10-byte header is decoded on its own so the log store can read the
//! payload with a second positioned read once its length is known.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{MiniDbError, Result};
use crate::types::{Key, Value};

/// Size of the fixed record header in bytes.
pub const HEADER_SIZE: usize = 10;

/// Operation tag stored in every record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum RecordKind {
    Put = 0,
    Delete = 1,
}

impl TryFrom<u16> for RecordKind {
    type Error = MiniDbError;

    fn try_from(tag: u16) -> Result<Self> {
        match tag {
            0 => Ok(RecordKind::Put),
            1 => Ok(RecordKind::Delete),
            other => Err(MiniDbError::MalformedHeader(format!(
                "unknown operation tag {}",
                other
            ))),
        }
    }
}

/// Decoded fixed-size header of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub key_size: u32,
    pub value_size: u32,
    pub kind: RecordKind,
}

impl RecordHeader {
    /// Parse the first `HEADER_SIZE` bytes of `buf`.
    pub fn decode(mut buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(MiniDbError::MalformedHeader(format!(
                "need {} header bytes, got {}",
                HEADER_SIZE,
                buf.len()
            )));
        }
        let key_size = buf.get_u32();
        let value_size = buf.get_u32();
        let kind = RecordKind::try_from(buf.get_u16())?;
        Ok(Self {
            key_size,
            value_size,
            kind,
        })
    }

    /// Number of payload bytes (key + value) following the header.
    pub fn payload_len(&self) -> u64 {
        self.key_size as u64 + self.value_size as u64
    }

    /// Total on-disk length of the record described by this header.
    pub fn record_len(&self) -> u64 {
        HEADER_SIZE as u64 + self.payload_len()
    }
}

/// A fully materialised record read back from the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub kind: RecordKind,
    pub key: Key,
    pub value: Value,
}

impl Record {
    /// Total on-disk length of this record.
    pub fn encoded_len(&self) -> u64 {
        (HEADER_SIZE + self.key.len() + self.value.len()) as u64
    }

    pub fn is_tombstone(&self) -> bool {
        self.kind == RecordKind::Delete
    }
}

/// Encode a record into header + key + value.
///
/// Fails only when a length does not fit in the 32-bit size fields.
pub fn encode(key: &[u8], value: &[u8], kind: RecordKind) -> Result<Bytes> {
    let (key_size, value_size) = match (u32::try_from(key.len()), u32::try_from(value.len())) {
        (Ok(k), Ok(v)) => (k, v),
        _ => {
            return Err(MiniDbError::RecordTooLarge {
                key_len: key.len(),
                value_len: value.len(),
            })
        }
    };

    let mut buf = BytesMut::with_capacity(HEADER_SIZE + key.len() + value.len());
    buf.put_u32(key_size);
    buf.put_u32(value_size);
    buf.put_u16(kind as u16);
    buf.put_slice(key);
    buf.put_slice(value);
    Ok(buf.freeze())
}
