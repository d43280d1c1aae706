//! Byte-range cache bridge
//!
//! Persists the first bytes of a stream so playback can start from disk.
//! Entries are keyed by the same identifier as the stream URL cache, and the
//! host may evict them at any time independently of the core.

use crate::{error::Result, platform::PlatformSendSync};

#[async_trait::async_trait]
pub trait ByteRangeCache: PlatformSendSync {
    /// Fetch and store up to `max_bytes` from the start of `url` under `key`.
    ///
    /// Returns the number of bytes now cached for the key. A short read
    /// (stream smaller than `max_bytes`) is a success.
    async fn prefetch(&self, key: &str, url: &str, max_bytes: u64) -> Result<u64>;

    /// Number of bytes currently cached for `key`.
    async fn cached_byte_count(&self, key: &str) -> Result<u64>;

    /// Whether `key` has a usable cached prefix.
    async fn is_cached(&self, key: &str) -> bool {
        matches!(self.cached_byte_count(key).await, Ok(count) if count > 0)
    }
}
