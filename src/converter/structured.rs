//! Bincode converter
//!
//! Generic converter for any serde type, encoded with bincode.

use std::fmt;
use std::marker::PhantomData;
use std::mem;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, SpillError};

use super::ByteConverter;

/// Converter for serde-serializable records
pub struct BincodeConverter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> BincodeConverter<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for BincodeConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BincodeConverter<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for BincodeConverter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BincodeConverter")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> ByteConverter<T> for BincodeConverter<T>
where
    T: Serialize + DeserializeOwned,
{
    fn serialize(&self, value: &T) -> Result<Vec<u8>> {
        bincode::serialize(value).map_err(|e| SpillError::Serialization(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<T> {
        bincode::deserialize(bytes).map_err(|e| SpillError::Deserialization(e.to_string()))
    }

    /// Inline size plus the encoded length as a proxy for heap data
    fn estimate_size(&self, value: &T) -> u64 {
        let inline = mem::size_of::<T>() as u64;
        match bincode::serialized_size(value) {
            Ok(encoded) => inline + encoded,
            Err(_) => inline,
        }
    }
}
