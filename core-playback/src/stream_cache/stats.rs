//! Stream URL cache statistics

use serde::{Deserialize, Serialize};

/// Counters for a [`StreamUrlCache`](super::StreamUrlCache).
///
/// All counters are cumulative since construction or the last `clear`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamCacheStats {
    /// Lookups that returned a live URL
    pub hits: u64,

    /// Lookups that found nothing or an expired entry
    pub misses: u64,

    pub insertions: u64,

    /// Live entries dropped to make room for a new key
    pub evictions: u64,

    /// Entries dropped because their TTL had passed
    pub expirations: u64,

    /// Entries stored when the stats were taken (expired ones included
    /// until the next purge)
    pub live_entries: usize,
}

impl StreamCacheStats {
    /// Fraction of lookups served from the cache, in `[0.0, 1.0]`.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            return 0.0;
        }

        self.hits as f64 / lookups as f64
    }
}
