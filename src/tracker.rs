//! Size Tracker
//!
//! Estimates the resident footprint of a SpillableMap without re-measuring it.
//!
//! ## Estimation
//! - The first `sample_window` admitted entries are measured individually
//!   and charged their measured size
//! - Average = ceil(sampled bytes / sampled entries)
//! - Once the window is full the average is frozen and every later entry is
//!   charged exactly that average, without calling the measure function
//!
//! ## Spill check
//! `current_footprint + average_entry_size > threshold`
//!
//! Only placement of new keys consults the check. Resident entries are never
//! demoted, and overwriting a resident value does not change its charge.

use tracing::debug;

/// Running footprint estimate for the resident tier
#[derive(Debug, Clone)]
pub struct SizeTracker {
    /// Budget in bytes
    threshold: u64,

    /// How many entries to measure before freezing the average
    sample_window: usize,

    /// Entries measured so far
    sample_count: usize,

    /// Sum of all measured sizes
    sampled_bytes: u64,

    /// Charge per entry (running during sampling, frozen afterwards)
    average_entry_size: u64,

    /// Sum of charges of currently resident entries
    current_footprint: u64,
}

impl SizeTracker {
    pub fn new(threshold: u64, sample_window: usize) -> Self {
        Self {
            threshold,
            sample_window,
            sample_count: 0,
            sampled_bytes: 0,
            average_entry_size: 0,
            current_footprint: 0,
        }
    }

    /// Would one more average-sized entry exceed the budget?
    pub fn should_spill(&self) -> bool {
        self.current_footprint.saturating_add(self.average_entry_size) > self.threshold
    }

    /// Account for a newly resident entry and return the charge to remember
    /// for it. `measure` is only called while sampling.
    pub fn admit<F>(&mut self, measure: F) -> u64
    where
        F: FnOnce() -> u64,
    {
        let charge = if self.is_sampling() {
            let size = measure();
            self.sample_count += 1;
            self.sampled_bytes = self.sampled_bytes.saturating_add(size);
            self.average_entry_size = self.sampled_bytes.div_ceil(self.sample_count as u64);
            if !self.is_sampling() {
                debug!(
                    samples = self.sample_count,
                    average = self.average_entry_size,
                    "Entry size sampling complete"
                );
            }
            size
        } else {
            self.average_entry_size
        };

        self.current_footprint = self.current_footprint.saturating_add(charge);
        charge
    }

    /// Give back the charge of an entry leaving the resident tier
    pub fn release(&mut self, charge: u64) {
        self.current_footprint = self.current_footprint.saturating_sub(charge);
    }

    /// Forget all samples and the footprint
    pub fn reset(&mut self) {
        self.sample_count = 0;
        self.sampled_bytes = 0;
        self.average_entry_size = 0;
        self.current_footprint = 0;
    }

    pub fn is_sampling(&self) -> bool {
        self.sample_count < self.sample_window
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn average_entry_size(&self) -> u64 {
        self.average_entry_size
    }

    pub fn current_footprint(&self) -> u64 {
        self.current_footprint
    }
}
