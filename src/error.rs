//! Error types for spillmap
//!
//! Provides a unified error type for all map, disk log and converter operations.

use thiserror::Error;

/// Result type alias using SpillError
pub type Result<T> = std::result::Result<T, SpillError>;

/// Unified error type for spillmap operations
#[derive(Debug, Error)]
pub enum SpillError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Conversion Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // -------------------------------------------------------------------------
    // Disk Log Errors
    // -------------------------------------------------------------------------
    #[error("Corrupt frame at offset {offset}: {reason}")]
    CorruptFrame { offset: u64, reason: String },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SpillError {
    pub(crate) fn corrupt(offset: u64, reason: impl Into<String>) -> Self {
        SpillError::CorruptFrame {
            offset,
            reason: reason.into(),
        }
    }
}
