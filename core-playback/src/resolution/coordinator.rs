use crate::error::{PlaybackError, Result};
use crate::stream_cache::StreamUrlCache;
use bridge_traits::StreamResolver;
use core_async::time::timeout;
use core_runtime::events::{CoreEvent, EventBus, StreamCacheEvent};
use core_runtime::logging::redact_url;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Cache-first stream URL resolution.
///
/// Failures are never returned to the caller: [`resolve`](Self::resolve)
/// logs them and yields `None`. Negative results are not cached and the
/// resolver is not retried; retrying is the caller's decision.
pub struct ResolutionCoordinator {
    cache: Arc<StreamUrlCache>,
    resolver: Arc<dyn StreamResolver>,
    timeout: Duration,
    event_bus: Option<Arc<EventBus>>,
}

impl ResolutionCoordinator {
    /// Create a coordinator.
    ///
    /// # Arguments
    ///
    /// * `cache` - Shared URL cache, outlives any single resolution
    /// * `resolver` - Host resolver invoked on a cache miss
    /// * `timeout` - Budget for one resolver call
    pub fn new(
        cache: Arc<StreamUrlCache>,
        resolver: Arc<dyn StreamResolver>,
        timeout: Duration,
    ) -> Self {
        Self {
            cache,
            resolver,
            timeout,
            event_bus: None,
        }
    }

    /// Set event bus for invalidation events.
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn cache(&self) -> &Arc<StreamUrlCache> {
        &self.cache
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Return a playable URL for `key`, or `None` if it cannot be resolved
    /// within the timeout.
    #[instrument(skip(self))]
    pub async fn resolve(&self, key: &str) -> Option<String> {
        match self.try_resolve(key).await {
            Ok(url) => Some(url),
            Err(err) => {
                warn!(error = %err, "Stream resolution failed");
                None
            }
        }
    }

    /// Like [`resolve`](Self::resolve) but reports why resolution failed.
    ///
    /// A hit in the cache returns immediately. On a miss the resolver is
    /// raced against the timeout and a successful answer is cached with
    /// the default TTL.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::ResolutionTimeout`] if the resolver overruns
    /// - [`PlaybackError::ResolutionFailed`] if it errors or panics
    /// - [`PlaybackError::EmptyResolution`] if it returns an empty URL
    pub async fn try_resolve(&self, key: &str) -> Result<String> {
        if let Some(url) = self.cache.get(key) {
            debug!(key, "Stream URL served from cache");
            return Ok(url);
        }

        // A panicking resolver must not take the caller down with it
        let call = AssertUnwindSafe(self.resolver.resolve(key)).catch_unwind();
        let stream = match timeout(self.timeout, call).await {
            Err(_) => {
                return Err(PlaybackError::ResolutionTimeout {
                    key: key.to_string(),
                    timeout: self.timeout,
                })
            }
            Ok(Err(_)) => {
                return Err(PlaybackError::ResolutionFailed {
                    key: key.to_string(),
                    message: format!("resolver '{}' panicked", self.resolver.name()),
                })
            }
            Ok(Ok(result)) => result.map_err(|err| PlaybackError::ResolutionFailed {
                key: key.to_string(),
                message: err.to_string(),
            })?,
        };

        if stream.url.trim().is_empty() {
            return Err(PlaybackError::EmptyResolution(key.to_string()));
        }

        debug!(
            key,
            url = redact_url(&stream.url),
            format = ?stream.format,
            bitrate_kbps = ?stream.bitrate_kbps,
            "Resolved stream URL"
        );

        self.cache.put(key, stream.url.clone());
        Ok(stream.url)
    }

    /// Forget the cached URL for `key`.
    ///
    /// Called when playback of a cached URL fails, typically because the
    /// remote side revoked it before its TTL ran out. Returns whether an
    /// entry was removed.
    pub fn invalidate(&self, key: &str) -> bool {
        let removed = self.cache.remove(key);
        if removed {
            info!(key, "Invalidated cached stream URL");
            if let Some(bus) = &self.event_bus {
                let _ = bus.emit(CoreEvent::StreamCache(StreamCacheEvent::Invalidated {
                    key: key.to_string(),
                }));
            }
        }
        removed
    }
}

impl std::fmt::Debug for ResolutionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionCoordinator")
            .field("resolver", &self.resolver.name())
            .field("timeout", &self.timeout)
            .field("cache", &self.cache)
            .finish()
    }
}
