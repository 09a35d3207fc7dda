use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

/// Flush/sync strategy for the WAL.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` after every write.
    #[default]
    EveryWrite,
    /// Flush to the OS page cache only.
    OsDefault,
}

/// Configuration for a [`WriteAheadLog`].
#[derive(Clone, Debug, Default)]
pub struct WalConfig {
    pub sync_mode: SyncMode,
}

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

struct WalWriter {
    writer: BufWriter<File>,
    /// Current write offset in the segment file.
    offset: u64,
}

/// Append-only, crash-recoverable log of `T` entries.
///
/// On-disk format per entry:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized T)]
/// ```
///
/// Recovery reads front-to-back. Entries failing the CRC check are skipped;
/// a truncated tail from a torn write is cut off when the log is opened so
/// that later appends stay readable.
pub struct WriteAheadLog<T> {
    path: PathBuf,
    writer: Mutex<WalWriter>,
    config: WalConfig,
    _entry: PhantomData<fn() -> T>,
}

struct Scan<T> {
    entries: Vec<T>,
    valid_len: u64,
}

impl<T: Serialize + DeserializeOwned> WriteAheadLog<T> {
    /// Open (or create) the log at `path` and return it with every
    /// recovered entry, in append order.
    pub fn open(path: &Path, config: WalConfig) -> StoreResult<(Self, Vec<T>)> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let scan = Self::scan(path)?;
        let file_len = file.metadata()?.len();
        if scan.valid_len < file_len {
            warn!(
                path = %path.display(),
                valid_len = scan.valid_len,
                file_len,
                "truncating torn WAL tail"
            );
            file.set_len(scan.valid_len)?;
            file.sync_all()?;
        }

        debug!(path = %path.display(), recovered = scan.entries.len(), "WAL opened");

        let wal = Self {
            path: path.to_path_buf(),
            writer: Mutex::new(WalWriter {
                writer: BufWriter::new(file),
                offset: scan.valid_len,
            }),
            config,
            _entry: PhantomData,
        };
        Ok((wal, scan.entries))
    }

    /// Append a single entry. Returns the byte offset of the entry.
    pub fn append(&self, entry: &T) -> StoreResult<u64> {
        let payload =
            bincode::serialize(entry).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let length = payload.len() as u32;
        let crc = crc32fast::hash(&payload);

        let mut w = self.writer.lock().expect("WAL mutex poisoned");
        let entry_offset = w.offset;

        w.writer.write_all(&length.to_le_bytes())?;
        w.writer.write_all(&crc.to_le_bytes())?;
        w.writer.write_all(&payload)?;
        w.writer.flush()?;

        if self.config.sync_mode == SyncMode::EveryWrite {
            w.writer.get_ref().sync_data()?;
        }

        w.offset += HEADER_SIZE as u64 + payload.len() as u64;

        debug!(offset = entry_offset, len = payload.len(), "WAL append");
        Ok(entry_offset)
    }

    /// Re-read every valid entry from disk.
    pub fn recover(&self) -> StoreResult<Vec<T>> {
        Ok(Self::scan(&self.path)?.entries)
    }

    /// Current write offset.
    pub fn offset(&self) -> u64 {
        self.writer.lock().expect("WAL mutex poisoned").offset
    }

    /// Path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn scan(path: &Path) -> StoreResult<Scan<T>> {
        let mut file = BufReader::new(File::open(path)?);
        let file_len = file.get_ref().metadata()?.len();
        let mut entries = Vec::new();
        let mut offset: u64 = 0;

        while offset + HEADER_SIZE as u64 <= file_len {
            let mut header = [0u8; HEADER_SIZE];
            match file.read_exact(&mut header) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }

            let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
            let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
            let next = offset + HEADER_SIZE as u64 + u64::from(length);

            if length == 0 || next > file_len {
                warn!(offset, length, file_len, "invalid WAL entry length; stopping recovery");
                break;
            }

            let mut payload = vec![0u8; length as usize];
            match file.read_exact(&mut payload) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    warn!(offset, "truncated WAL entry; stopping recovery");
                    break;
                }
                Err(e) => return Err(e.into()),
            }

            let actual_crc = crc32fast::hash(&payload);
            if actual_crc != expected_crc {
                warn!(
                    offset,
                    expected = expected_crc,
                    actual = actual_crc,
                    "CRC mismatch; skipping entry"
                );
                offset = next;
                continue;
            }

            match bincode::deserialize::<T>(&payload) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(offset, error = %e, "failed to deserialize WAL entry; skipping"),
            }

            offset = next;
        }

        Ok(Scan {
            entries,
            valid_len: offset,
        })
    }
}
