//! Stream preload facade crate.
//!
//! Re-exports the public surface of the workspace crates so host
//! applications can depend on `stream-preload` alone.
//!
//! - [`bridges`] - contracts the host implements (resolver, byte cache, clock)
//! - [`runtime`] - logging, configuration and the event bus
//! - [`playback`] - URL cache, resolution and the preload scheduler

pub use bridge_traits as bridges;
pub use core_playback as playback;
pub use core_runtime as runtime;

pub use core_playback::{
    PlaybackError, PreloadConfig, PreloadScheduler, PreloadService, PreloadSnapshot,
    StreamCacheConfig, StreamUrlCache,
};
pub use core_runtime::config::CoreConfig;
