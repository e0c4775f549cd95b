//! Tag lookups by full directory scan
//!
//! There is no persistent tag index. Every lookup decodes every entry file,
//! so the answer can never disagree with the entries themselves. Bulk flushes
//! are not atomic: an entry written between the scan and the removal may be
//! removed or survive.

use crate::cache::store::FileBackend;
use crate::error::CacheResult;
use tracing::{debug, warn};

impl FileBackend {
    pub fn find_identifiers_by_tag(&self, tag: &str) -> Vec<String> {
        self.find_identifiers_by_tags(&[tag.to_string()])
    }

    /// Identifiers of live entries carrying any of `tags`, in directory order.
    ///
    /// An empty `tags` matches nothing.
    pub fn find_identifiers_by_tags(&self, tags: &[String]) -> Vec<String> {
        if tags.is_empty() {
            return Vec::new();
        }

        let entries = match self.enumerate() {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Tag scan of cache {} failed: {}", self.name, e);
                return Vec::new();
            }
        };

        let now = self.clock.now();
        let matches: Vec<String> = entries
            .into_iter()
            .filter(|(_, path)| {
                self.read_entry(path)
                    .is_some_and(|entry| !entry.is_expired(now) && entry.has_any_tag(tags))
            })
            .map(|(identifier, _)| identifier)
            .collect();

        debug!("Tags {:?} matched {} entries", tags, matches.len());
        matches
    }

    pub fn flush_by_tag(&self, tag: &str) -> CacheResult<usize> {
        self.flush_by_tags(&[tag.to_string()])
    }

    /// Remove every live entry carrying any of `tags`; returns how many were removed
    pub fn flush_by_tags(&self, tags: &[String]) -> CacheResult<usize> {
        self.ensure_mutable()?;

        let mut removed = 0;
        for identifier in self.find_identifiers_by_tags(tags) {
            if self.remove(&identifier)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
