//! # Stream Resolution
//!
//! Turns item keys into playable URLs, consulting the stream URL cache
//! before the network.
//!
//! - [`ResolutionCoordinator`] - cache first, then a time-bounded resolver call
//! - [`FallbackResolver`] - chains several resolvers behind one interface

mod coordinator;
mod fallback;

pub use coordinator::ResolutionCoordinator;
pub use fallback::FallbackResolver;
