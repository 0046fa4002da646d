//! Converters for strings and raw byte vectors
//!
//! Estimates use length rather than capacity so they are deterministic.

use std::mem;

use crate::error::{Result, SpillError};

use super::ByteConverter;

/// UTF-8 converter for `String` keys and values
#[derive(Debug, Clone, Copy, Default)]
pub struct StringConverter;

impl ByteConverter<String> for StringConverter {
    fn serialize(&self, value: &String) -> Result<Vec<u8>> {
        Ok(value.as_bytes().to_vec())
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<String> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| SpillError::Deserialization(format!("invalid UTF-8: {}", e)))
    }

    fn estimate_size(&self, value: &String) -> u64 {
        (mem::size_of::<String>() + value.len()) as u64
    }
}

/// Identity converter for `Vec<u8>`
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesConverter;

impl ByteConverter<Vec<u8>> for BytesConverter {
    fn serialize(&self, value: &Vec<u8>) -> Result<Vec<u8>> {
        Ok(value.clone())
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }

    fn estimate_size(&self, value: &Vec<u8>) -> u64 {
        (mem::size_of::<Vec<u8>>() + value.len()) as u64
    }
}
