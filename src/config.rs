//! Configuration for a SpillableMap
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, SpillError};

/// Number of admitted entries measured before the average entry size is frozen
pub const DEFAULT_SAMPLE_WINDOW: usize = 100;

/// Main configuration for a SpillableMap instance
#[derive(Debug, Clone)]
pub struct SpillConfig {
    // -------------------------------------------------------------------------
    // Memory Budget
    // -------------------------------------------------------------------------
    /// Estimated resident footprint (in bytes) above which new keys spill to disk
    pub size_threshold_bytes: u64,

    /// Number of admitted entries whose size is measured individually.
    /// After this many, the running average is frozen and charged per entry.
    pub sample_window: usize,

    // -------------------------------------------------------------------------
    // Disk Log Configuration
    // -------------------------------------------------------------------------
    /// Directory that holds the spill file.
    /// Internal structure:
    ///   {base_dir}/
    ///     └── spillmap-<pid>-<seq>-<nanos>.log
    ///
    /// Created on first spill, not at construction.
    pub base_dir: PathBuf,

    /// Delete the spill file when the map is closed or dropped
    pub delete_on_close: bool,

    /// fdatasync after every appended frame
    pub sync_on_append: bool,
}

impl Default for SpillConfig {
    fn default() -> Self {
        Self {
            size_threshold_bytes: 64 * 1024 * 1024, // 64 MB
            sample_window: DEFAULT_SAMPLE_WINDOW,
            base_dir: std::env::temp_dir(),
            delete_on_close: true,
            sync_on_append: false,
        }
    }
}

impl SpillConfig {
    /// Create a new config builder
    pub fn builder() -> SpillConfigBuilder {
        SpillConfigBuilder::default()
    }

    /// Check the values that cannot be meaningfully used
    pub fn validate(&self) -> Result<()> {
        if self.sample_window == 0 {
            return Err(SpillError::Config(
                "sample_window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for SpillConfig
#[derive(Default)]
pub struct SpillConfigBuilder {
    config: SpillConfig,
}

impl SpillConfigBuilder {
    /// Set the resident footprint budget (in bytes)
    pub fn size_threshold_bytes(mut self, bytes: u64) -> Self {
        self.config.size_threshold_bytes = bytes;
        self
    }

    /// Set the number of entries sampled before the average is frozen
    pub fn sample_window(mut self, count: usize) -> Self {
        self.config.sample_window = count;
        self
    }

    /// Set the directory for the spill file
    pub fn base_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.base_dir = path.into();
        self
    }

    /// Keep or delete the spill file on close and drop
    pub fn delete_on_close(mut self, delete: bool) -> Self {
        self.config.delete_on_close = delete;
        self
    }

    /// Sync every append to stable storage
    pub fn sync_on_append(mut self, sync: bool) -> Self {
        self.config.sync_on_append = sync;
        self
    }

    pub fn build(self) -> SpillConfig {
        self.config
    }
}
