//! Garbage collection of expired entries

use crate::cache::store::FileBackend;
use tracing::{debug, info, warn};

/// Outcome of one sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GcStats {
    /// Entries removed because they were expired or unreadable
    pub removed: usize,
    /// Entries left in place
    pub kept: usize,
}

impl FileBackend {
    /// Remove every expired entry. Unreadable or corrupt files count as expired.
    ///
    /// Does nothing while frozen. The sweep runs to completion in one call.
    pub fn collect_garbage(&self) -> GcStats {
        let mut stats = GcStats::default();
        if self.is_frozen() {
            debug!("Skipping garbage collection of frozen cache {}", self.name);
            return stats;
        }

        let entries = match self.enumerate() {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Garbage collection of cache {} failed: {}", self.name, e);
                return stats;
            }
        };

        for (identifier, path) in entries {
            if !self.is_entry_file_expired(&path) {
                stats.kept += 1;
                continue;
            }
            match self.remove(&identifier) {
                Ok(true) => stats.removed += 1,
                Ok(false) => {}
                Err(e) => warn!("Failed to collect cache entry {}: {}", identifier, e),
            }
        }

        info!(
            "Collected garbage in cache {}: {} removed, {} kept",
            self.name, stats.removed, stats.kept
        );
        stats
    }
}
