//! # Core Configuration Module
//!
//! Collects the host bridges the preload core depends on.
//!
//! ## Overview
//!
//! [`CoreConfig`] is built with a builder that fails fast when a required
//! bridge is missing, so misconfiguration is reported at startup instead of
//! on the first preload.
//!
//! ## Required Dependencies
//!
//! - `StreamResolver` - turns item keys into playable URLs
//! - `ByteRangeCache` - stores the prefetched stream prefix
//!
//! ## Optional Dependencies
//!
//! - `Clock` - defaults to [`SystemClock`]
//! - `EventBus` - preload and cache events are only published when set
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .stream_resolver(Arc::new(MyResolver))
//!     .byte_range_cache(Arc::new(MyByteCache))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Panics: no resolver or byte cache was injected
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing required bridges");
//! ```

use crate::error::{Error, Result};
use crate::events::EventBus;
use bridge_traits::{ByteRangeCache, Clock, StreamResolver, SystemClock};
use std::sync::Arc;

/// Host bridges shared by every preload component.
#[derive(Clone)]
pub struct CoreConfig {
    /// URL resolver (required)
    pub stream_resolver: Arc<dyn StreamResolver>,

    /// Byte prefix storage (required)
    pub byte_range_cache: Arc<dyn ByteRangeCache>,

    /// Time source for URL expiry
    pub clock: Arc<dyn Clock>,

    /// Event bus for preload notifications (optional)
    pub event_bus: Option<Arc<EventBus>>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("stream_resolver", &self.stream_resolver.name())
            .field("byte_range_cache", &"ByteRangeCache { ... }")
            .field("clock", &"Clock { ... }")
            .field("event_bus", &self.event_bus)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }
}

fn stream_resolver_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "StreamResolver".to_string(),
        message: "StreamResolver implementation is required to turn item keys into playable URLs. \
                 Inject the host extractor (or a FallbackResolver chain) before building."
            .to_string(),
    }
}

fn byte_range_cache_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "ByteRangeCache".to_string(),
        message: "ByteRangeCache implementation is required to store prefetched stream bytes. \
                 Inject the player's disk cache before building."
            .to_string(),
    }
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    stream_resolver: Option<Arc<dyn StreamResolver>>,
    byte_range_cache: Option<Arc<dyn ByteRangeCache>>,
    clock: Option<Arc<dyn Clock>>,
    event_bus: Option<Arc<EventBus>>,
}

impl CoreConfigBuilder {
    /// Sets the stream resolver (required).
    pub fn stream_resolver(mut self, resolver: Arc<dyn StreamResolver>) -> Self {
        self.stream_resolver = Some(resolver);
        self
    }

    /// Sets the byte-range cache (required).
    pub fn byte_range_cache(mut self, cache: Arc<dyn ByteRangeCache>) -> Self {
        self.byte_range_cache = Some(cache);
        self
    }

    /// Overrides the time source. Tests inject a `ManualClock` here.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapabilityMissing`] naming the first absent
    /// required bridge.
    pub fn build(self) -> Result<CoreConfig> {
        let stream_resolver = self
            .stream_resolver
            .ok_or_else(stream_resolver_missing_error)?;
        let byte_range_cache = self
            .byte_range_cache
            .ok_or_else(byte_range_cache_missing_error)?;
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);

        Ok(CoreConfig {
            stream_resolver,
            byte_range_cache,
            clock,
            event_bus: self.event_bus,
        })
    }
}
