//! TTL-bounded result cache keyed by normalized subject identity.
//!
//! Expiry is passive: a stale entry reads as a miss and is overwritten
//! by the next insert for its key. No background sweep runs, so the map
//! retains stale entries until they are rewritten — acceptable for the
//! bounded set of subjects a deployment analyzes within one TTL window.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Concurrent TTL cache with atomic per-key get/insert.
///
/// Keys carry a stage discriminator prefix (`lead:`, `repo:`, `tech:`,
/// `contact:`, `company:`) so stage-level and whole-profile caching
/// coexist in separate instances without colliding semantics.
pub struct TtlCache<V> {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached value for `key` if it is present and fresh.
    /// A stale entry is treated as a miss.
    pub async fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.inserted_at.elapsed() >= self.ttl {
            return None;
        }
        Some(entry.value.clone())
    }

    /// Stores `value` under `key`, resetting its TTL window and silently
    /// overwriting any previous (possibly stale) entry.
    pub async fn insert(&self, key: &str, value: V) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_owned(),
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }
}
