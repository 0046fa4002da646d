//! Sequential replay of a spill file
//!
//! Reads frames front to back without an index. Replaying an untouched file
//! and keeping the last frame per key reproduces what the index pointed at.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{Result, SpillError};

use super::{frame, LEN_PREFIX_SIZE};

/// One frame as found in the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub offset: u64,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// Reads every frame of a spill file in write order
pub struct FrameReader {
    reader: BufReader<File>,
    /// Offset of the next frame
    offset: u64,
    /// File length at open time
    end: u64,
    /// Set after the first error so iteration stops
    failed: bool,
}

impl FrameReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let end = file.metadata()?.len();
        Ok(Self {
            reader: BufReader::new(file),
            offset: 0,
            end,
            failed: false,
        })
    }

    fn read_frame(&mut self) -> Result<Frame> {
        let offset = self.offset;
        let key = self.read_chunk(offset)?;
        let value = self.read_chunk(offset)?;
        self.offset += frame::frame_len(key.len(), value.len());
        Ok(Frame { offset, key, value })
    }

    /// Read one `[len][bytes]` chunk
    fn read_chunk(&mut self, frame_offset: u64) -> Result<Vec<u8>> {
        let mut prefix = [0u8; LEN_PREFIX_SIZE as usize];
        self.read_exact_or_corrupt(&mut prefix, frame_offset)?;
        let len = u32::from_le_bytes(prefix) as usize;

        let mut chunk = vec![0u8; len];
        self.read_exact_or_corrupt(&mut chunk, frame_offset)?;
        Ok(chunk)
    }

    fn read_exact_or_corrupt(&mut self, buf: &mut [u8], frame_offset: u64) -> Result<()> {
        self.reader.read_exact(buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => {
                SpillError::corrupt(frame_offset, "file ends inside a frame")
            }
            _ => SpillError::Io(e),
        })
    }
}

impl Iterator for FrameReader {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.end {
            return None;
        }
        let result = self.read_frame();
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

/// Fold a spill file into its latest value per key
pub fn replay_latest(path: &Path) -> Result<HashMap<Vec<u8>, Vec<u8>>> {
    let mut latest = HashMap::new();
    for frame in FrameReader::open(path)? {
        let frame = frame?;
        latest.insert(frame.key, frame.value);
    }
    Ok(latest)
}
