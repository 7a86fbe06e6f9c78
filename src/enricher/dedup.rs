use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Remembers recently processed item ids so re-submitted inputs are
/// skipped instead of double-spending quota.
#[derive(Clone)]
pub struct DedupCache {
    seen: Arc<DashMap<String, Instant>>,
    ttl: Duration,
}

impl DedupCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            seen: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Returns true if the id has not been seen within the TTL, recording
    /// it in the same atomic step. Expired entries are refreshed in place.
    pub fn check_and_insert(&self, id: &str) -> bool {
        match self.seen.entry(id.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(mut entry) => {
                if entry.get().elapsed() >= self.ttl {
                    entry.insert(Instant::now());
                    true
                } else {
                    false
                }
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(Instant::now());
                true
            }
        }
    }

    /// Drop expired entries. Iterates the whole map, so call it at run
    /// boundaries rather than from the per-item path.
    pub fn cleanup(&self) {
        self.seen.retain(|_, at| at.elapsed() < self.ttl);
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn first_sighting_passes_repeat_does_not() {
        let cache = DedupCache::new(Duration::from_secs(60));
        assert!(cache.check_and_insert("alice.bsky.social"));
        assert!(!cache.check_and_insert("alice.bsky.social"));
        assert!(cache.check_and_insert("bob.bsky.social"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn expired_entries_are_readmitted() {
        let cache = DedupCache::new(Duration::from_millis(50));
        assert!(cache.check_and_insert("alice.bsky.social"));

        thread::sleep(Duration::from_millis(80));
        assert!(cache.check_and_insert("alice.bsky.social"));
    }

    #[test]
    fn cleanup_drops_expired_entries() {
        let cache = DedupCache::new(Duration::from_millis(50));
        cache.check_and_insert("alice.bsky.social");
        cache.check_and_insert("bob.bsky.social");

        thread::sleep(Duration::from_millis(80));
        cache.cleanup();
        assert!(cache.is_empty());
    }
}
