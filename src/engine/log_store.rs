//! MiniDB - Log Store
//! Owns the data file handle and the current write offset.
//!
//! Records are written and read with positioned I/O, so a read of an
//! earlier offset never shares a file cursor with an in-flight append.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::error::{MiniDbError, Result};
use crate::types::Offset;

use super::record::{Record, RecordHeader, HEADER_SIZE};

/// Append-only file of records with a tracked end-of-file offset.
pub struct LogStore {
    /// Path to the data file on disk.
    path: PathBuf,
    /// File handle opened for positioned reads and writes.
    file: File,
    /// Byte length of the log; the next record lands here.
    write_offset: Offset,
    /// Whether to sync after every append.
    sync_writes: bool,
}

impl LogStore {
    /// Open or create the data file at `path`.
    /// The write offset starts at the current file size.
    pub fn open(path: impl AsRef<Path>, sync_writes: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;
        let write_offset = file.metadata()?.len();

        Ok(Self {
            path,
            file,
            write_offset,
            sync_writes,
        })
    }

    /// Open an existing data file without write access, so appends fail.
    #[cfg(test)]
    pub(crate) fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).open(&path)?;
        let write_offset = file.metadata()?.len();
        Ok(Self {
            path,
            file,
            write_offset,
            sync_writes: false,
        })
    }

    /// Returns the path to the data file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current byte length of the log.
    pub fn len(&self) -> Offset {
        self.write_offset
    }

    pub fn is_empty(&self) -> bool {
        self.write_offset == 0
    }

    /// Write an encoded record at the end of the log and return its starting offset.
    /// The write offset only advances once the whole record is written.
    /// On failure the file is cut back to the previous length, so no partial
    /// record is left for the next open to replay.
    pub fn append(&mut self, record: &Bytes) -> Result<Offset> {
        self.append_with(record, write_all_at)
    }

    fn append_with<W>(&mut self, record: &[u8], write: W) -> Result<Offset>
    where
        W: FnOnce(&File, &[u8], u64) -> io::Result<()>,
    {
        let offset = self.write_offset;
        let written = write(&self.file, record, offset).and_then(|()| {
            if self.sync_writes {
                self.file.sync_data()
            } else {
                Ok(())
            }
        });

        if let Err(err) = written {
            if let Err(rollback) = self.file.set_len(offset) {
                log::error!(
                    "failed to cut {:?} back to {} bytes after a failed append: {}",
                    self.path,
                    offset,
                    rollback
                );
            }
            return Err(err.into());
        }

        self.write_offset += record.len() as u64;
        Ok(offset)
    }

    /// Read the record starting at `offset`.
    ///
    /// Returns `EndOfLog` when `offset` is at or past the end of the log,
    /// `MalformedHeader` when fewer than a header's worth of bytes remain,
    /// and `TruncatedRecord` when the payload runs past the end of the log.
    pub fn read_at(&self, offset: Offset) -> Result<Record> {
        if offset >= self.write_offset {
            return Err(MiniDbError::EndOfLog(offset));
        }
        let available = self.write_offset - offset;

        let mut header_buf = [0u8; HEADER_SIZE];
        let header_len = available.min(HEADER_SIZE as u64) as usize;
        self.read_exact(&mut header_buf[..header_len], offset, HEADER_SIZE as u64)?;
        let header = RecordHeader::decode(&header_buf[..header_len])?;

        if header.record_len() > available {
            return Err(MiniDbError::TruncatedRecord {
                offset,
                expected: header.record_len(),
                available,
            });
        }

        let mut key = vec![0u8; header.key_size as usize];
        let mut value = vec![0u8; header.value_size as usize];
        let key_offset = offset + HEADER_SIZE as u64;
        self.read_exact(&mut key, key_offset, header.record_len())?;
        self.read_exact(&mut value, key_offset + key.len() as u64, header.record_len())?;

        Ok(Record {
            kind: header.kind,
            key,
            value,
        })
    }

    /// Flush written records to the storage device.
    pub fn sync(&self) -> Result<()> {
        self.file.sync_data()?;
        Ok(())
    }

    /// Positioned read that reports a short file as a truncated record.
    fn read_exact(&self, buf: &mut [u8], at: Offset, expected: u64) -> Result<()> {
        match read_exact_at(&self.file, buf, at) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                Err(MiniDbError::TruncatedRecord {
                    offset: at,
                    expected,
                    available: self.write_offset.saturating_sub(at),
                })
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(unix)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(unix)]
fn write_all_at(file: &File, buf: &[u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.write_all_at(buf, offset)
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "failed to fill whole buffer",
                ))
            }
            Ok(n) => {
                let tmp = buf;
                buf = &mut tmp[n..];
                offset += n as u64;
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

#[cfg(windows)]
fn write_all_at(file: &File, mut buf: &[u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_write(buf, offset) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "failed to write whole buffer",
                ))
            }
            Ok(n) => {
                buf = &buf[n..];
                offset += n as u64;
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(())
}
