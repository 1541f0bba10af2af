//! Response caching for arXiv feeds.
//!
//! Caching is a capability handed to [`ArxivSource`](crate::sources::ArxivSource), not
//! module state. Keys are request URLs, which the query builder produces
//! deterministically, and values are raw feed bodies that already parsed cleanly.
//! [`NoCache`] is the default; [`MemoryCache`] keeps bodies in process for a TTL.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::config::CacheConfig;

/// Result of a cache lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheResult<T> {
    /// Item was found and is valid
    Hit(T),

    /// Item was not found
    Miss,

    /// Item was found but has expired
    Expired,
}

/// Storage for fetched feed bodies
pub trait ResponseCache: Send + Sync + Debug {
    /// Look up a body by request URL
    fn get(&self, key: &str) -> CacheResult<String>;

    /// Store a body under its request URL
    fn put(&self, key: &str, body: &str);
}

/// Cache that never stores anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl ResponseCache for NoCache {
    fn get(&self, _key: &str) -> CacheResult<String> {
        CacheResult::Miss
    }

    fn put(&self, _key: &str, _body: &str) {}
}

#[derive(Debug)]
struct CachedBody {
    stored_at: Instant,
    body: String,
}

/// In-process cache with a time-to-live and an entry limit
///
/// When full, the oldest entry is evicted.
#[derive(Debug)]
pub struct MemoryCache {
    ttl: Duration,
    max_entries: usize,
    entries: Mutex<HashMap<String, CachedBody>>,
}

impl MemoryCache {
    /// Create a cache holding at most `max_entries` bodies for `ttl` each
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries: max_entries.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Create a cache from the `[cache]` configuration section
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(Duration::from_secs(config.ttl_seconds), config.max_entries)
    }

    /// Number of stored bodies, expired ones included
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every stored body
    pub fn clear(&self) {
        self.entries().clear();
    }

    /// Lock the entries, recovering them if a holder panicked
    ///
    /// Each operation leaves the map consistent, so a poisoned lock still guards valid data.
    fn entries(&self) -> MutexGuard<'_, HashMap<String, CachedBody>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Response cache lock poisoned, recovering entries");
            PoisonError::into_inner(poisoned)
        })
    }
}

impl ResponseCache for MemoryCache {
    fn get(&self, key: &str) -> CacheResult<String> {
        let mut entries = self.entries();

        match entries.get(key) {
            Some(cached) if cached.stored_at.elapsed() < self.ttl => {
                tracing::debug!("Cache HIT for {}", key);
                CacheResult::Hit(cached.body.clone())
            }
            Some(_) => {
                tracing::debug!("Cache expired for {}", key);
                entries.remove(key);
                CacheResult::Expired
            }
            None => {
                tracing::debug!("Cache MISS for {}", key);
                CacheResult::Miss
            }
        }
    }

    fn put(&self, key: &str, body: &str) {
        let mut entries = self.entries();

        if entries.len() >= self.max_entries && !entries.contains_key(key) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, cached)| cached.stored_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key.to_string(),
            CachedBody {
                stored_at: Instant::now(),
                body: body.to_string(),
            },
        );
    }
}
