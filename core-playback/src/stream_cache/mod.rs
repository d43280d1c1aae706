//! # Stream URL Cache
//!
//! In-memory TTL cache mapping item keys to resolved stream URLs.
//!
//! ## Overview
//!
//! Resolved URLs are signed and expire on the remote side, so every entry
//! carries an absolute `expires_at` computed from an injected [`Clock`].
//! An entry is live while `now <= expires_at`.
//!
//! - Reads (`get`, `contains`, `len`) drop the expired entries they touch.
//! - When a new key arrives at capacity, all expired entries are purged
//!   first. If the cache is still full, the live entry with the smallest
//!   `expires_at` is evicted (earliest insertion wins a tie).
//!
//! Eviction is by soonest expiry, not recency of use: the entry evicted is
//! the one that would have had to be re-resolved first anyway.
//!
//! All operations take a short synchronous lock and never await, so the
//! cache can be consulted from async code without holding anything across
//! a suspension point.
//!
//! ## Usage
//!
//! ```rust
//! use bridge_traits::SystemClock;
//! use core_playback::config::StreamCacheConfig;
//! use core_playback::stream_cache::StreamUrlCache;
//! use std::sync::Arc;
//!
//! let cache = StreamUrlCache::new(StreamCacheConfig::default(), Arc::new(SystemClock));
//! cache.put("yt:dQw4w9WgXcQ", "https://media.example.com/v?sig=1");
//! assert!(cache.contains("yt:dQw4w9WgXcQ"));
//! ```

mod stats;

pub use stats::StreamCacheStats;

use crate::config::StreamCacheConfig;
use bridge_traits::Clock;
use chrono::{DateTime, TimeDelta, Utc};
use core_runtime::events::{CoreEvent, EventBus, StreamCacheEvent};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

#[derive(Debug, Clone)]
struct CacheEntry {
    url: String,
    expires_at: DateTime<Utc>,
    /// Insertion order, used to break expiry ties deterministically
    seq: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    next_seq: u64,
    stats: StreamCacheStats,
}

impl CacheState {
    fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let purged = before - self.entries.len();
        self.stats.expirations += purged as u64;
        purged
    }

    /// Drops the entry closest to expiry and returns its key.
    fn evict_soonest_expiring(&mut self) -> Option<String> {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| (entry.expires_at, entry.seq))
            .map(|(key, _)| key.clone())?;

        self.entries.remove(&victim);
        self.stats.evictions += 1;
        Some(victim)
    }

    /// Looks up `key`, dropping it if expired.
    fn live_entry(&mut self, key: &str, now: DateTime<Utc>) -> Option<&CacheEntry> {
        let expired = self.entries.get(key)?.is_expired(now);
        if expired {
            self.entries.remove(key);
            self.stats.expirations += 1;
            trace!(key, "Stream URL expired");
            return None;
        }
        self.entries.get(key)
    }
}

/// Capacity-bounded TTL cache for resolved stream URLs.
pub struct StreamUrlCache {
    config: StreamCacheConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<CacheState>,
    event_bus: Option<Arc<EventBus>>,
}

impl StreamUrlCache {
    /// Create an empty cache. `max_entries` of zero is treated as one.
    pub fn new(config: StreamCacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            state: Mutex::new(CacheState::default()),
            event_bus: None,
        }
    }

    /// Publish eviction events on `event_bus`.
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn config(&self) -> &StreamCacheConfig {
        &self.config
    }

    fn capacity(&self) -> usize {
        self.config.max_entries.max(1)
    }

    /// Store `url` under `key` for the configured default TTL.
    pub fn put(&self, key: impl Into<String>, url: impl Into<String>) {
        self.put_with_ttl(key, url, self.config.default_ttl);
    }

    /// Store `url` under `key`, valid for `ttl` from now.
    ///
    /// Replaces any existing entry for the key. Inserting a new key into a
    /// full cache evicts one entry first. Never fails.
    pub fn put_with_ttl(&self, key: impl Into<String>, url: impl Into<String>, ttl: Duration) {
        let key = key.into();
        let now = self.clock.now();
        let expires_at = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let evicted = {
            let mut state = self.state.lock();
            let mut evicted = None;

            if !state.entries.contains_key(&key) && state.entries.len() >= self.capacity() {
                state.purge_expired(now);
                if state.entries.len() >= self.capacity() {
                    evicted = state.evict_soonest_expiring();
                }
            }

            let seq = state.next_seq;
            state.next_seq += 1;
            state.entries.insert(
                key.clone(),
                CacheEntry {
                    url: url.into(),
                    expires_at,
                    seq,
                },
            );
            state.stats.insertions += 1;
            evicted
        };

        trace!(key = %key, ttl_secs = ttl.as_secs(), "Stream URL cached");

        if let Some(victim) = evicted {
            debug!(key = %victim, "Evicted stream URL closest to expiry");
            self.emit(StreamCacheEvent::Evicted { key: victim });
        }
    }

    /// Return the cached URL for `key` if it has not expired.
    pub fn get(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        let mut state = self.state.lock();

        let url = state.live_entry(key, now).map(|entry| entry.url.clone());
        if url.is_some() {
            state.stats.hits += 1;
        } else {
            state.stats.misses += 1;
        }
        url
    }

    /// Same expiry semantics as [`get`](Self::get) without cloning the URL
    /// or touching the hit/miss counters.
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.state.lock().live_entry(key, now).is_some()
    }

    /// Expiry instant of the live entry for `key`.
    pub fn expires_at(&self, key: &str) -> Option<DateTime<Utc>> {
        let now = self.clock.now();
        self.state
            .lock()
            .live_entry(key, now)
            .map(|entry| entry.expires_at)
    }

    /// Remove `key`. Returns whether an entry (expired or not) was present.
    pub fn remove(&self, key: &str) -> bool {
        self.state.lock().entries.remove(key).is_some()
    }

    /// Drop every entry and reset the statistics.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.stats = StreamCacheStats::default();
    }

    /// Number of live entries. Expired entries are purged before counting.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.purge_expired(now);
        state.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let purged = self.state.lock().purge_expired(now);
        if purged > 0 {
            debug!(purged, "Purged expired stream URLs");
        }
        purged
    }

    pub fn stats(&self) -> StreamCacheStats {
        let state = self.state.lock();
        StreamCacheStats {
            live_entries: state.entries.len(),
            ..state.stats
        }
    }

    fn emit(&self, event: StreamCacheEvent) {
        if let Some(bus) = &self.event_bus {
            // No subscribers is fine
            let _ = bus.emit(CoreEvent::StreamCache(event));
        }
    }
}

impl std::fmt::Debug for StreamUrlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamUrlCache")
            .field("config", &self.config)
            .field("entries", &self.state.lock().entries.len())
            .finish()
    }
}
