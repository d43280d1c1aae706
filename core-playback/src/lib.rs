//! # Stream Preload Core
//!
//! Makes streamed playback feel local.
//!
//! ## Overview
//!
//! This crate handles:
//! - Caching resolved stream URLs for their short validity window
//! - Cache-first, time-bounded URL resolution with resolver fallback
//! - Warming a sliding window of queue items (URL plus a byte prefix),
//!   cancelling obsolete work as the playback position moves
//!
//! Network resolution and byte storage are host bridges
//! (`bridge_traits::StreamResolver`, `bridge_traits::ByteRangeCache`).
//! Nothing in this crate is required for playback to work: a key that is
//! not warm simply streams on demand.

pub mod config;
pub mod error;
pub mod preload;
pub mod resolution;
pub mod service;
pub mod stream_cache;

pub use config::{PreloadConfig, StreamCacheConfig};
pub use error::{PlaybackError, Result};
pub use preload::{
    JobPhase, PreloadEligibility, PreloadJobId, PreloadScheduler, PreloadSnapshot, RemoteOnly,
    WindowUpdate,
};
pub use resolution::{FallbackResolver, ResolutionCoordinator};
pub use service::PreloadService;
pub use stream_cache::{StreamCacheStats, StreamUrlCache};
