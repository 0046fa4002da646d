//! Disk Log
//!
//! Owns the spill file and the index of the newest frame for each key.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::hash::Hash;
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{info, trace, warn};

use crate::config::SpillConfig;
use crate::converter::ByteConverter;
use crate::error::{Result, SpillError};

use super::iterator::DiskLogIter;
use super::{frame, FramePointer};

/// Distinguishes spill files created by the same process
static NEXT_LOG_ID: AtomicU64 = AtomicU64::new(1);

/// Append-only spill file with an in-memory index
///
/// ## Lifecycle:
/// - The file path is chosen at construction, but nothing touches the
///   filesystem until the first `append`
/// - `clear` deletes the file; the next `append` creates it again
/// - `close` (or drop) deletes the file when `delete_on_close` is set
///
/// ## Concurrency:
/// - Writes need `&mut self`
/// - Reads take `&self`; the read handle sits behind a Mutex because
///   seeking mutates its cursor
pub struct DiskLog<K, KC> {
    /// Directory holding the spill file (created lazily)
    base_dir: PathBuf,

    /// Full path of the spill file
    path: PathBuf,

    /// Encodes keys into frames
    key_converter: KC,

    /// Key → newest frame for that key
    index: HashMap<K, FramePointer>,

    /// Open file handles, `None` until the first append
    file: Option<LogFile>,

    /// End of the last complete frame
    write_offset: u64,

    /// Sum of frame lengths still addressed by the index
    live_bytes: u64,

    sync_on_append: bool,
    delete_on_close: bool,
}

impl<K, KC> DiskLog<K, KC>
where
    K: Hash + Eq,
    KC: ByteConverter<K>,
{
    /// Create a disk log that will live under `config.base_dir`
    pub fn new(config: &SpillConfig, key_converter: KC) -> Self {
        let path = Self::log_path(&config.base_dir);
        Self {
            base_dir: config.base_dir.clone(),
            path,
            key_converter,
            index: HashMap::new(),
            file: None,
            write_offset: 0,
            live_bytes: 0,
            sync_on_append: config.sync_on_append,
            delete_on_close: config.delete_on_close,
        }
    }

    /// Append a frame for `key` and point the index at it
    ///
    /// Returns the offset of the new frame. The index is only updated once
    /// the whole frame is written; a failed write is truncated away.
    pub fn append(&mut self, key: K, value: &[u8]) -> Result<u64> {
        let key_bytes = self.key_converter.serialize(&key)?;
        let frame = frame::encode(&key_bytes, value)?;
        let offset = self.write_offset;
        let sync = self.sync_on_append;

        let file = self.open_file()?;
        if let Err(e) = file.write_frame(offset, &frame, sync) {
            if let Err(rollback) = file.writer.set_len(offset) {
                warn!(
                    offset,
                    error = %rollback,
                    "Failed to truncate partial frame after write error"
                );
            }
            return Err(e.into());
        }

        let pointer = FramePointer {
            offset,
            len: frame.len() as u64,
        };
        trace!(offset, len = pointer.len, "Appended frame");

        self.write_offset += pointer.len;
        self.live_bytes += pointer.len;
        if let Some(previous) = self.index.insert(key, pointer) {
            self.live_bytes -= previous.len;
        }

        Ok(offset)
    }

    /// Read the value bytes of the newest frame for `key`
    ///
    /// Returns:
    /// - `Ok(Some(bytes))` — key is indexed
    /// - `Ok(None)` — key is not on disk
    pub fn read(&self, key: &K) -> Result<Option<Bytes>> {
        let pointer = match self.index.get(key) {
            Some(&p) => p,
            None => return Ok(None),
        };
        let file = self.file.as_ref().ok_or_else(|| {
            SpillError::corrupt(pointer.offset, "index entry without a spill file")
        })?;
        file.read_value(pointer).map(Some)
    }

    /// Drop `key` from the index. The frame bytes stay in the file.
    pub fn remove(&mut self, key: &K) -> bool {
        match self.index.remove(key) {
            Some(pointer) => {
                self.live_bytes -= pointer.len;
                true
            }
            None => false,
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Snapshot of the indexed keys
    pub fn keys(&self) -> HashSet<K>
    where
        K: Clone,
    {
        self.index.keys().cloned().collect()
    }

    /// Number of indexed keys
    pub fn num_entries(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Location of the newest frame for `key`
    pub fn frame_pointer(&self, key: &K) -> Option<FramePointer> {
        self.index.get(key).copied()
    }

    /// Iterate over every indexed key, reading each value on demand
    pub fn iter(&self) -> DiskLogIter<'_, K> {
        DiskLogIter::new(self.index.iter(), self.file.as_ref())
    }

    /// Empty the index and delete the spill file
    pub fn clear(&mut self) -> Result<()> {
        self.index.clear();
        self.write_offset = 0;
        self.live_bytes = 0;
        self.remove_file()?;
        Ok(())
    }

    /// Release the file handles, deleting the file if configured to
    pub fn close(mut self) -> Result<()> {
        self.dispose()?;
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Path of the spill file (may not exist yet)
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes appended so far, including unreachable frames
    pub fn bytes_written(&self) -> u64 {
        self.write_offset
    }

    /// Bytes held by frames the index no longer points at
    pub fn garbage_bytes(&self) -> u64 {
        self.write_offset - self.live_bytes
    }

    pub fn key_converter(&self) -> &KC {
        &self.key_converter
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Open the spill file on first use
    fn open_file(&mut self) -> Result<&mut LogFile> {
        let file = match self.file.take() {
            Some(file) => file,
            None => {
                let file = LogFile::create(&self.base_dir, &self.path)?;
                info!(path = %self.path.display(), "Created spill file");
                file
            }
        };
        Ok(self.file.insert(file))
    }

    /// Close handles and delete the file if one was created
    fn remove_file(&mut self) -> io::Result<()> {
        if self.file.take().is_none() {
            return Ok(());
        }
        fs::remove_file(&self.path)?;
        info!(path = %self.path.display(), "Deleted spill file");
        Ok(())
    }

    fn dispose(&mut self) -> io::Result<()> {
        if self.delete_on_close {
            self.remove_file()
        } else {
            self.file = None;
            Ok(())
        }
    }

    /// "{base_dir}/spillmap-<pid>-<seq>-<nanos>.log"
    fn log_path(base_dir: &Path) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let id = NEXT_LOG_ID.fetch_add(1, Ordering::Relaxed);
        base_dir.join(format!(
            "spillmap-{}-{}-{}.log",
            std::process::id(),
            id,
            nanos
        ))
    }
}

impl<K, KC> Drop for DiskLog<K, KC> {
    fn drop(&mut self) {
        if !self.delete_on_close || self.file.take().is_none() {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to delete spill file");
        }
    }
}

// =============================================================================
// File Handles
// =============================================================================

/// Write handle plus an independent read handle on the same file
pub(super) struct LogFile {
    writer: File,
    reader: Mutex<File>,
}

impl LogFile {
    fn create(base_dir: &Path, path: &Path) -> io::Result<Self> {
        fs::create_dir_all(base_dir)?;
        let writer = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        let reader = File::open(path)?;
        Ok(Self {
            writer,
            reader: Mutex::new(reader),
        })
    }

    fn write_frame(&mut self, offset: u64, frame: &[u8], sync: bool) -> io::Result<()> {
        self.writer.seek(SeekFrom::Start(offset))?;
        self.writer.write_all(frame)?;
        if sync {
            self.writer.sync_data()?;
        }
        Ok(())
    }

    /// Read the frame at `pointer` and return its value portion
    pub(super) fn read_value(&self, pointer: FramePointer) -> Result<Bytes> {
        let mut buf = vec![0u8; pointer.len as usize];
        {
            let mut reader = self.reader.lock();
            reader.seek(SeekFrom::Start(pointer.offset))?;
            if let Err(e) = reader.read_exact(&mut buf) {
                return Err(match e.kind() {
                    ErrorKind::UnexpectedEof => SpillError::corrupt(
                        pointer.offset,
                        format!("expected {} bytes, file ended early", pointer.len),
                    ),
                    _ => SpillError::Io(e),
                });
            }
        }

        let (_, value_range) = frame::decode(&buf, pointer.offset)?;
        Ok(Bytes::from(buf).slice(value_range))
    }
}
