//! # Preload Configuration
//!
//! Tunables for the stream URL cache and the preload window.

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Stream URL cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamCacheConfig {
    /// Validity window applied when a URL is stored without an explicit TTL.
    ///
    /// Signed stream URLs typically live a few hours; staying well below
    /// that keeps a margin for clock skew.
    ///
    /// Default: 30 minutes.
    #[serde(default = "default_ttl")]
    pub default_ttl: Duration,

    /// Hard cap on live entries.
    ///
    /// Default: 50.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for StreamCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: default_ttl(),
            max_entries: default_max_entries(),
        }
    }
}

impl StreamCacheConfig {
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.default_ttl.is_zero() {
            return Err(PlaybackError::InvalidConfig(
                "default_ttl must be > 0".to_string(),
            ));
        }

        if self.max_entries == 0 {
            return Err(PlaybackError::InvalidConfig(
                "max_entries must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Preload window configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadConfig {
    #[serde(default)]
    pub stream_cache: StreamCacheConfig,

    /// Number of upcoming items warmed ahead of the current one.
    ///
    /// The previous item is warmed in addition to these. Zero warms only
    /// the previous item.
    ///
    /// Default: 3.
    #[serde(default = "default_max_preload_items")]
    pub max_preload_items: usize,

    /// Budget for a single URL resolution, cache miss included.
    ///
    /// Default: 30 seconds.
    #[serde(default = "default_resolution_timeout")]
    pub resolution_timeout: Duration,

    /// Size of the stream prefix stored per warmed item (in bytes).
    ///
    /// Default: 3 MiB.
    #[serde(default = "default_prefetch_bytes")]
    pub prefetch_bytes: u64,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            stream_cache: StreamCacheConfig::default(),
            max_preload_items: default_max_preload_items(),
            resolution_timeout: default_resolution_timeout(),
            prefetch_bytes: default_prefetch_bytes(),
        }
    }
}

impl PreloadConfig {
    pub fn with_stream_cache(mut self, stream_cache: StreamCacheConfig) -> Self {
        self.stream_cache = stream_cache;
        self
    }

    pub fn with_max_preload_items(mut self, count: usize) -> Self {
        self.max_preload_items = count;
        self
    }

    pub fn with_resolution_timeout(mut self, timeout: Duration) -> Self {
        self.resolution_timeout = timeout;
        self
    }

    pub fn with_prefetch_bytes(mut self, bytes: u64) -> Self {
        self.prefetch_bytes = bytes;
        self
    }

    /// Upper bound on concurrently active warming jobs.
    pub fn max_concurrent_jobs(&self) -> usize {
        self.max_preload_items + 1
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        self.stream_cache.validate()?;

        if self.resolution_timeout.is_zero() {
            return Err(PlaybackError::InvalidConfig(
                "resolution_timeout must be > 0".to_string(),
            ));
        }

        if self.prefetch_bytes == 0 {
            return Err(PlaybackError::InvalidConfig(
                "prefetch_bytes must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_ttl() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_max_entries() -> usize {
    50
}

fn default_max_preload_items() -> usize {
    3
}

fn default_resolution_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_prefetch_bytes() -> u64 {
    3 * 1024 * 1024 // 3 MiB
}
