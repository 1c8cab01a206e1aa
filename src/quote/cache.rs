//! Short-lived cache of raw aggregator responses.

use crate::quote::request::CacheKey;
use lru::LruCache;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Cache entry: raw quote + insertion time for TTL expiry.
struct CacheEntry {
    quote: Arc<Value>,
    inserted_at: Instant,
}

/// Bounded, time-expiring map from [`CacheKey`] to the aggregator's raw JSON.
///
/// Lookups never refresh an entry, so the LRU order is the insertion order and
/// a full cache evicts the oldest insert. Entries older than the TTL are
/// treated as absent and dropped lazily.
pub struct QuoteCache {
    entries: Mutex<LruCache<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl QuoteCache {
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<Value>> {
        let mut entries = self.lock();
        let entry = entries.peek(key)?;
        if entry.inserted_at.elapsed() > self.ttl {
            entries.pop(key);
            return None;
        }
        Some(Arc::clone(&entry.quote))
    }

    /// Insert or overwrite `key` with a fresh TTL.
    ///
    /// Returns the key pushed out to make room, if the cache was full.
    /// Overwriting an existing key evicts nothing.
    pub fn put(&self, key: CacheKey, quote: Arc<Value>) -> Option<CacheKey> {
        let mut entries = self.lock();
        self.purge_expired(&mut entries);
        let entry = CacheEntry {
            quote,
            inserted_at: Instant::now(),
        };
        let (displaced, _) = entries.push(key.clone(), entry)?;
        if displaced == key {
            return None;
        }
        trace!(evicted = ?displaced, "quote cache full, evicted oldest entry");
        Some(displaced)
    }

    /// Number of physically stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    /// Drop expired entries from the oldest end.
    ///
    /// The TTL is fixed, so expiry order equals insertion order and the sweep
    /// can stop at the first live entry.
    fn purge_expired(&self, entries: &mut LruCache<CacheKey, CacheEntry>) {
        while let Some((_, oldest)) = entries.peek_lru() {
            if oldest.inserted_at.elapsed() <= self.ttl {
                break;
            }
            entries.pop_lru();
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<CacheKey, CacheEntry>> {
        // Entries are replaced whole, a panic elsewhere cannot leave one half-written.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
