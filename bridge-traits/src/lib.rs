//! # Host Bridge Traits
//!
//! Contracts between the stream preload core and the host application.
//!
//! ## Traits
//!
//! - [`StreamResolver`](resolver::StreamResolver) - turns an item key into a playable URL
//! - [`ByteRangeCache`](byte_range::ByteRangeCache) - persists a prefix of the stream bytes
//! - [`Clock`](time::Clock) - time source for URL expiry, swappable in tests
//! - [`LoggerSink`](time::LoggerSink) - forwards structured logs to host logging
//!
//! ## Error Handling
//!
//! Every bridge reports failures as [`BridgeError`](error::BridgeError).
//! Implementations should convert platform errors and keep messages
//! actionable; the core never surfaces them to the user.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync`: they are shared as `Arc<dyn _>`
//! between concurrently running preload jobs.

pub mod byte_range;
pub mod catalog;
pub mod error;
pub mod platform;
pub mod resolver;
pub mod time;

pub use error::BridgeError;

pub use byte_range::ByteRangeCache;
pub use catalog::{ItemSource, QueueItem};
pub use resolver::{ResolvedStream, StreamResolver};
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
