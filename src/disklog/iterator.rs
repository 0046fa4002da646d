//! Disk Log Iterator
//!
//! Walks the index and reads each frame on demand.

use std::collections::hash_map;

use bytes::Bytes;

use crate::error::{Result, SpillError};

use super::log::LogFile;
use super::FramePointer;

/// Iterator over `(key, value bytes)` for every indexed key
///
/// Holds no lock between items; each `next` takes the read handle only
/// for the duration of one frame read.
pub struct DiskLogIter<'a, K> {
    entries: hash_map::Iter<'a, K, FramePointer>,
    file: Option<&'a LogFile>,
}

impl<'a, K> DiskLogIter<'a, K> {
    pub(super) fn new(
        entries: hash_map::Iter<'a, K, FramePointer>,
        file: Option<&'a LogFile>,
    ) -> Self {
        Self { entries, file }
    }
}

impl<'a, K> Iterator for DiskLogIter<'a, K> {
    type Item = Result<(&'a K, Bytes)>;

    fn next(&mut self) -> Option<Self::Item> {
        let (key, pointer) = self.entries.next()?;
        let file = match self.file {
            Some(file) => file,
            None => {
                return Some(Err(SpillError::corrupt(
                    pointer.offset,
                    "index entry without a spill file",
                )))
            }
        };
        Some(file.read_value(*pointer).map(|value| (key, value)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}
