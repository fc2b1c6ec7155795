//! Traversal statistics.
//!
//! [`ProcessStats`] counts what the file processor did with each dequeued
//! entry. Traversal is single-threaded, so these are plain counters.
//!
//! # Examples
//!
//! ```
//! use bd_scanner::ProcessStats;
//!
//! let stats = ProcessStats { leaves: 3, containers: 1, unknown: 1, ..ProcessStats::default() };
//! assert_eq!(stats.processed(), 5);
//! assert!((stats.container_percent() - 20.0).abs() < 0.01);
//! ```

use serde::{Deserialize, Serialize};

/// Counters collected while draining the worklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcessStats {
    /// Leaf files processed.
    pub leaves: u64,
    /// Scene containers processed.
    pub containers: u64,
    /// Files of unrecognised type processed.
    pub unknown: u64,
    /// Containers visited without a scene tool.
    pub degraded: u64,
    /// Files added to the store because a container referenced them.
    pub discovered: u64,
    /// Links accepted into the registry.
    pub links: u64,
    /// References outside the root recorded but not followed.
    pub external_skipped: u64,
    /// References to files that do not exist.
    pub missing: u64,
    /// Links refused because they would close a cycle.
    pub cycles_rejected: u64,
    /// Dequeued entries that had already been processed.
    pub duplicates: u64,
    /// Files whose metadata extraction failed.
    pub failed: u64,
}

impl ProcessStats {
    /// Number of entries processed.
    #[inline]
    #[must_use]
    pub const fn processed(&self) -> u64 {
        self.leaves + self.containers + self.unknown
    }

    /// Share of processed entries that were scene containers.
    ///
    /// Returns 0.0 if nothing was processed.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Acceptable for statistics display
    pub fn container_percent(&self) -> f64 {
        let processed = self.processed();
        if processed == 0 {
            return 0.0;
        }
        (self.containers as f64 / processed as f64) * 100.0
    }
}
