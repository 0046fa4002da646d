//! Disk Log Module
//!
//! Append-only spill file paired with an in-memory key → frame index.
//!
//! ## Responsibilities
//! - Append length-prefixed frames to a single file per map
//! - Keep the index pointing at the newest frame of each key
//! - Read a key's value back with one seek and one read
//! - Replay a file sequentially (last frame per key wins)
//!
//! ## File Format
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │ Frame 1                                               │
//! │ ┌────────────┬───────┬──────────────┬───────────────┐ │
//! │ │KeyLen (4)  │  Key  │ ValueLen (4) │     Value     │ │
//! │ └────────────┴───────┴──────────────┴───────────────┘ │
//! ├───────────────────────────────────────────────────────┤
//! │ Frame 2 ... (repeated, lengths little-endian u32)     │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! No header, checksum or compaction. Frames for overwritten or removed keys
//! stay in the file but are never addressed by the index.

mod frame;
mod iterator;
mod log;
mod replay;

pub use iterator::DiskLogIter;
pub use log::DiskLog;
pub use replay::{replay_latest, Frame, FrameReader};

/// Size of each length prefix in a frame
pub const LEN_PREFIX_SIZE: u64 = 4;

/// Location of a frame inside the spill file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePointer {
    /// Byte offset of the frame's first length prefix
    pub offset: u64,
    /// Total frame length, both prefixes included
    pub len: u64,
}
