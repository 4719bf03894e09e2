//! Bounded, time-aware cache of resolved verification keys
//!
//! The cache maps a key id to the JWK it resolved to, together with the
//! time of insertion. Entries expire by age and the total entry count is
//! bounded, with the oldest-inserted entry evicted first. Overflow is
//! corrected incrementally: each insertion removes at most one entry, so
//! the count converges on the bound rather than being forced to it in a
//! single pass.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use jsonwebtoken::jwk::Jwk;
use tracing::debug;

use crate::error::{AuthError, Result};

/// Freshness policy for cached keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAge {
    /// Entries never go stale
    NeverExpire,
    /// Entries older than this are evicted on the next lookup.
    /// A zero duration means every entry is already expired.
    Max(Duration),
}

/// Bound on the number of retained entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheCapacity {
    /// No bound on the entry count
    Unbounded,
    /// Caching is turned off entirely; nothing is ever retained
    Disabled,
    /// At most this many entries are retained
    Bounded(usize),
}

#[derive(Debug, Clone)]
struct CachedKey {
    key: Jwk,
    inserted_at: SystemTime,
    /// Monotonic insertion sequence, breaks eviction ties when two
    /// entries share the same `inserted_at`
    seq: u64,
}

/// In-memory key cache owned by a single [`JwksClient`](crate::JwksClient)
///
/// Both [`get`](KeyCache::get) and [`add`](KeyCache::add) mutate the
/// entry map (expiry eviction and overflow eviction respectively), so the
/// owning client serializes all access behind an exclusive lock.
#[derive(Debug)]
pub struct KeyCache {
    entries: HashMap<String, CachedKey>,
    max_key_age: KeyAge,
    capacity: CacheCapacity,
    next_seq: u64,
}

impl KeyCache {
    /// Create a cache with the given freshness and size policies
    pub fn new(max_key_age: KeyAge, capacity: CacheCapacity) -> Self {
        Self {
            entries: HashMap::new(),
            max_key_age,
            capacity,
            next_seq: 0,
        }
    }

    /// Create a cache that retains every key forever
    ///
    /// This is the default used by [`JwksClient`](crate::JwksClient) when
    /// no cache is supplied.
    pub fn persistent() -> Self {
        Self::new(KeyAge::NeverExpire, CacheCapacity::Unbounded)
    }

    /// Look up a key by id
    ///
    /// Returns [`AuthError::KeyNotFound`] when caching is disabled or no
    /// entry exists, and [`AuthError::KeyExpired`] when the entry aged
    /// past the freshness window. An expired entry is removed as a side
    /// effect of the lookup.
    pub fn get(&mut self, kid: &str) -> Result<Jwk> {
        if self.capacity == CacheCapacity::Disabled || !self.entries.contains_key(kid) {
            return Err(AuthError::KeyNotFound {
                kid: kid.to_string(),
            });
        }
        if self.key_is_expired(kid) {
            self.entries.remove(kid);
            debug!(kid = %kid, "removed expired key from cache");
            return Err(AuthError::KeyExpired {
                kid: kid.to_string(),
            });
        }
        Ok(self.entries[kid].key.clone())
    }

    /// Insert the key matching `kid` from a freshly downloaded key set
    ///
    /// Scans `downloaded` for a key whose id equals `kid`; when absent the
    /// cache is left untouched and [`AuthError::KeyNotFound`] is returned.
    /// When present, the entry is inserted (or refreshed with a new
    /// timestamp), overflow handling runs once, and the key is returned.
    /// With caching disabled nothing is retained and the lookup fails.
    pub fn add(&mut self, kid: &str, downloaded: &[Jwk]) -> Result<Jwk> {
        let found = downloaded
            .iter()
            .find(|key| key.common.key_id.as_deref() == Some(kid));
        let Some(key) = found else {
            return Err(AuthError::KeyNotFound {
                kid: kid.to_string(),
            });
        };
        if self.capacity == CacheCapacity::Disabled {
            return Err(AuthError::KeyNotFound {
                kid: kid.to_string(),
            });
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            kid.to_string(),
            CachedKey {
                key: key.clone(),
                inserted_at: SystemTime::now(),
                seq,
            },
        );
        self.handle_overflow();
        debug!(kid = %kid, entries = self.entries.len(), "cached downloaded key");
        Ok(key.clone())
    }

    /// Number of currently retained entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is retained
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evict the single oldest-inserted entry when the count exceeds the
    /// bound. Runs once per insertion, so a burst of inserts can leave the
    /// cache transiently above the bound by the number of still-uncorrected
    /// insertions minus one.
    fn handle_overflow(&mut self) {
        let CacheCapacity::Bounded(max) = self.capacity else {
            return;
        };
        if self.entries.len() <= max {
            return;
        }
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| (entry.inserted_at, entry.seq))
            .map(|(kid, _)| kid.clone());
        if let Some(kid) = oldest {
            self.entries.remove(&kid);
            debug!(kid = %kid, "evicted oldest key to honor cache bound");
        }
    }

    /// Pure staleness predicate; never mutates the entry map
    fn key_is_expired(&self, kid: &str) -> bool {
        let KeyAge::Max(max) = self.max_key_age else {
            return false;
        };
        let Some(entry) = self.entries.get(kid) else {
            return false;
        };
        if max.is_zero() {
            return true;
        }
        match entry.inserted_at.elapsed() {
            Ok(age) => age > max,
            // Clock went backwards; treat as stale and refetch
            Err(_) => true,
        }
    }
}
