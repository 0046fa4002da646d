//! Converter Module
//!
//! Turns keys and values into bytes for the disk log, and estimates their
//! in-memory footprint for the size tracker.
//!
//! ## Responsibilities
//! - Serialize a value into a self-contained byte sequence
//! - Deserialize bytes back into a value (malformed input is an error)
//! - Estimate the resident footprint of a value without serializing it
//!
//! Estimates only drive placement decisions. Frame lengths on disk always come
//! from the serialized bytes, so a bad estimate cannot corrupt the log.

mod structured;
mod primitive;

pub use structured::BincodeConverter;
pub use primitive::{BytesConverter, StringConverter};

use crate::error::Result;

/// Byte conversion contract between a value type and the disk log
pub trait ByteConverter<T> {
    /// Encode a value, failing with `SpillError::Serialization`
    fn serialize(&self, value: &T) -> Result<Vec<u8>>;

    /// Decode a value, failing with `SpillError::Deserialization`
    fn deserialize(&self, bytes: &[u8]) -> Result<T>;

    /// Best-effort estimate of the value's in-memory size in bytes
    fn estimate_size(&self, value: &T) -> u64;
}
