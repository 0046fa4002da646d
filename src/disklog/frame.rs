//! Frame encoding
//!
//! `[key_len: u32 LE][key][value_len: u32 LE][value]`

use std::ops::Range;

use crate::error::{Result, SpillError};

use super::LEN_PREFIX_SIZE;

const PREFIX: usize = LEN_PREFIX_SIZE as usize;

/// Total encoded length of a frame
pub(crate) fn frame_len(key_len: usize, value_len: usize) -> u64 {
    2 * LEN_PREFIX_SIZE + key_len as u64 + value_len as u64
}

/// Encode one frame into a fresh buffer
pub(crate) fn encode(key: &[u8], value: &[u8]) -> Result<Vec<u8>> {
    let key_len = u32::try_from(key.len()).map_err(|_| {
        SpillError::Serialization(format!("key too large for a frame: {} bytes", key.len()))
    })?;
    let value_len = u32::try_from(value.len()).map_err(|_| {
        SpillError::Serialization(format!(
            "value too large for a frame: {} bytes",
            value.len()
        ))
    })?;

    let mut buf = Vec::with_capacity(frame_len(key.len(), value.len()) as usize);
    buf.extend_from_slice(&key_len.to_le_bytes());
    buf.extend_from_slice(key);
    buf.extend_from_slice(&value_len.to_le_bytes());
    buf.extend_from_slice(value);
    Ok(buf)
}

/// Split a complete frame into its key and value byte ranges.
///
/// `offset` is only used for error reporting.
pub(crate) fn decode(buf: &[u8], offset: u64) -> Result<(Range<usize>, Range<usize>)> {
    let key_len = read_len(buf, 0, offset)?;
    let key_range = PREFIX..PREFIX + key_len;

    let value_len = read_len(buf, key_range.end, offset)?;
    let value_start = key_range.end + PREFIX;
    let value_range = value_start..value_start + value_len;

    if value_range.end != buf.len() {
        return Err(SpillError::corrupt(
            offset,
            format!(
                "frame declares {} bytes but {} are available",
                value_range.end,
                buf.len()
            ),
        ));
    }

    Ok((key_range, value_range))
}

fn read_len(buf: &[u8], at: usize, offset: u64) -> Result<usize> {
    let bytes: [u8; PREFIX] = buf
        .get(at..at + PREFIX)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| {
            SpillError::corrupt(
                offset,
                format!("truncated length prefix at frame byte {}", at),
            )
        })?;
    Ok(u32::from_le_bytes(bytes) as usize)
}
