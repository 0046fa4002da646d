//! # spillmap
//!
//! A memory-bounded key-value map for record-merge paths:
//! - Resident tier holds values fully deserialized
//! - Overflow keys are spilled to an append-only disk log
//! - Sampled size estimation decides where each new key lands
//! - Pluggable byte conversion for keys and values
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      SpillableMap                            │
//! │             (put / get / remove / iter / clear)              │
//! └──────────┬──────────────────┬───────────────────┬───────────┘
//!            │                  │                   │
//!            ▼                  ▼                   ▼
//!   ┌─────────────────┐ ┌───────────────┐ ┌──────────────────┐
//!   │  Resident Tier  │ │  SizeTracker  │ │     DiskLog      │
//!   │    (HashMap)    │ │  (footprint)  │ │ (index + frames) │
//!   └─────────────────┘ └───────┬───────┘ └────────┬─────────┘
//!                               │                  │
//!                               ▼                  ▼
//!                       ┌─────────────────────────────────┐
//!                       │          ByteConverter           │
//!                       │  (serialize / estimate_size)     │
//!                       └─────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use spillmap::{SpillableMap, StringConverter};
//!
//! let mut map = SpillableMap::new(16, "/tmp/spill", StringConverter, StringConverter).unwrap();
//! map.put("k1".to_string(), "v1".to_string()).unwrap();
//! map.put("k2".to_string(), "v2".to_string()).unwrap();
//!
//! assert_eq!(map.len(), 2);
//! assert!(map.disk_entry_count() > 0);
//! assert_eq!(map.get(&"k2".to_string()).unwrap(), Some("v2".to_string()));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod converter;
pub mod disklog;
pub mod tracker;
pub mod map;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{SpillError, Result};
pub use config::SpillConfig;
pub use converter::{BincodeConverter, ByteConverter, BytesConverter, StringConverter};
pub use disklog::DiskLog;
pub use tracker::SizeTracker;
pub use map::{SpillableMap, SpillableMapIter};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of spillmap
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
