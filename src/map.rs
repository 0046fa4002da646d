//! Spillable Map
//!
//! The public map facade over the resident tier and the disk log.
//!
//! ## Placement
//! - A key lives in exactly one tier: resident or on disk
//! - New keys go to the resident tier while the size tracker has budget,
//!   otherwise they are serialized and appended to the disk log
//! - Updates stay in the key's current tier; there is no promotion or
//!   demotion between tiers

use std::collections::{hash_map, HashMap, HashSet};
use std::hash::Hash;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::SpillConfig;
use crate::converter::ByteConverter;
use crate::disklog::{DiskLog, DiskLogIter};
use crate::error::Result;
use crate::tracker::SizeTracker;

/// A resident value and the footprint charge it was admitted with
#[derive(Debug)]
struct Resident<V> {
    value: V,
    charge: u64,
}

/// Memory-bounded map that spills overflow entries to an append-only file
///
/// ## Concurrency Model: single owner
///
/// - Mutations take `&mut self`; reads take `&self`
/// - Disk-tier calls block on file I/O
/// - Share across threads by wrapping the whole map in a Mutex
pub struct SpillableMap<K, V, KC, VC> {
    /// Map configuration
    config: SpillConfig,

    /// Resident tier, values fully deserialized
    resident: HashMap<K, Resident<V>>,

    /// Disk tier (owns the key converter)
    disk: DiskLog<K, KC>,

    /// Footprint estimate gating admission of new keys
    tracker: SizeTracker,

    /// Encodes values for the disk tier
    value_converter: VC,
}

impl<K, V, KC, VC> SpillableMap<K, V, KC, VC>
where
    K: Hash + Eq,
    KC: ByteConverter<K>,
    VC: ByteConverter<V>,
{
    /// Create a map with the default config, a budget and a spill directory
    ///
    /// The directory is not touched until the first spill, so an unusable
    /// path only fails the `put` that first needs the disk.
    pub fn new(
        size_threshold_bytes: u64,
        base_dir: impl Into<PathBuf>,
        key_converter: KC,
        value_converter: VC,
    ) -> Result<Self> {
        let config = SpillConfig::builder()
            .size_threshold_bytes(size_threshold_bytes)
            .base_dir(base_dir)
            .build();
        Self::with_config(config, key_converter, value_converter)
    }

    /// Create a map from a full config
    pub fn with_config(config: SpillConfig, key_converter: KC, value_converter: VC) -> Result<Self> {
        config.validate()?;
        let tracker = SizeTracker::new(config.size_threshold_bytes, config.sample_window);
        let disk = DiskLog::new(&config, key_converter);
        Ok(Self {
            config,
            resident: HashMap::new(),
            disk,
            tracker,
            value_converter,
        })
    }

    /// Insert or update a key
    ///
    /// Steps:
    /// 1. Resident key → replace in place (charge unchanged)
    /// 2. On-disk key → append a new frame
    /// 3. New key → resident if the tracker has budget, else append
    pub fn put(&mut self, key: K, value: V) -> Result<()> {
        if let Some(entry) = self.resident.get_mut(&key) {
            entry.value = value;
            return Ok(());
        }

        if self.disk.contains_key(&key) {
            return self.append_to_disk(key, &value);
        }

        if self.tracker.should_spill() {
            if self.disk.is_empty() {
                debug!(
                    footprint = self.tracker.current_footprint(),
                    threshold = self.tracker.threshold(),
                    "Resident budget exhausted, spilling new keys to disk"
                );
            }
            return self.append_to_disk(key, &value);
        }

        let key_converter = self.disk.key_converter();
        let value_converter = &self.value_converter;
        let charge = self.tracker.admit(|| {
            key_converter.estimate_size(&key) + value_converter.estimate_size(&value)
        });
        self.resident.insert(key, Resident { value, charge });
        Ok(())
    }

    /// Get a value by key
    ///
    /// Search order:
    /// 1. Resident tier (no I/O)
    /// 2. Disk log (read + deserialize)
    pub fn get(&self, key: &K) -> Result<Option<V>>
    where
        V: Clone,
    {
        if let Some(entry) = self.resident.get(key) {
            return Ok(Some(entry.value.clone()));
        }

        match self.disk.read(key)? {
            Some(bytes) => self.value_converter.deserialize(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Remove a key from whichever tier holds it and return its value
    ///
    /// A failed disk read leaves the key in place.
    pub fn remove(&mut self, key: &K) -> Result<Option<V>> {
        if let Some(entry) = self.resident.remove(key) {
            self.tracker.release(entry.charge);
            return Ok(Some(entry.value));
        }

        let value = match self.disk.read(key)? {
            Some(bytes) => self.value_converter.deserialize(&bytes)?,
            None => return Ok(None),
        };
        self.disk.remove(key);
        Ok(Some(value))
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.resident.contains_key(key) || self.disk.contains_key(key)
    }

    /// Number of keys across both tiers
    pub fn len(&self) -> usize {
        self.resident.len() + self.disk.num_entries()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Union of resident and on-disk keys
    pub fn keys(&self) -> HashSet<K>
    where
        K: Clone,
    {
        let mut keys = self.disk.keys();
        keys.extend(self.resident.keys().cloned());
        keys
    }

    /// Iterate over all values: resident first, then on-disk values
    /// deserialized one at a time
    pub fn iter(&self) -> SpillableMapIter<'_, K, V, VC> {
        SpillableMapIter {
            resident: self.resident.values(),
            disk: self.disk.iter(),
            value_converter: &self.value_converter,
        }
    }

    /// Remove every key and delete the spill file
    pub fn clear(&mut self) -> Result<()> {
        self.resident.clear();
        self.tracker.reset();
        self.disk.clear()?;
        debug!("Cleared spillable map");
        Ok(())
    }

    /// Release the spill file, deleting it if `delete_on_close` is set
    pub fn close(self) -> Result<()> {
        self.disk.close()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Serialize before touching the file, so a failed conversion appends nothing
    fn append_to_disk(&mut self, key: K, value: &V) -> Result<()> {
        let bytes = self.value_converter.serialize(value)?;
        self.disk.append(key, &bytes)?;
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Number of keys in the disk tier; non-zero once spilling has begun
    pub fn disk_entry_count(&self) -> usize {
        self.disk.num_entries()
    }

    pub fn resident_entry_count(&self) -> usize {
        self.resident.len()
    }

    pub fn is_resident(&self, key: &K) -> bool {
        self.resident.contains_key(key)
    }

    pub fn is_on_disk(&self, key: &K) -> bool {
        self.disk.contains_key(key)
    }

    /// Tracked footprint of the resident tier
    pub fn current_footprint(&self) -> u64 {
        self.tracker.current_footprint()
    }

    pub fn average_entry_size(&self) -> u64 {
        self.tracker.average_entry_size()
    }

    /// Bytes appended to the spill file, including stale frames
    pub fn disk_bytes_written(&self) -> u64 {
        self.disk.bytes_written()
    }

    pub fn disk_garbage_bytes(&self) -> u64 {
        self.disk.garbage_bytes()
    }

    pub fn disk_file_path(&self) -> &Path {
        self.disk.path()
    }

    pub fn config(&self) -> &SpillConfig {
        &self.config
    }
}

/// Iterator over every value of a SpillableMap
pub struct SpillableMapIter<'a, K, V, VC> {
    resident: hash_map::Values<'a, K, Resident<V>>,
    disk: DiskLogIter<'a, K>,
    value_converter: &'a VC,
}

impl<'a, K, V, VC> Iterator for SpillableMapIter<'a, K, V, VC>
where
    V: Clone,
    VC: ByteConverter<V>,
{
    type Item = Result<V>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(entry) = self.resident.next() {
            return Some(Ok(entry.value.clone()));
        }
        let item = self.disk.next()?;
        Some(item.and_then(|(_, bytes)| self.value_converter.deserialize(&bytes)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (resident, _) = self.resident.size_hint();
        let (disk, _) = self.disk.size_hint();
        let total = resident + disk;
        (total, Some(total))
    }
}
