//! Thread-safety bound shared by every bridge trait.
//!
//! Bridges are held as `Arc<dyn Trait>` and called from spawned preload jobs
//! that may run on any worker thread, so implementations must be
//! `Send + Sync`.

/// Marker trait applied to every bridge trait object.
pub trait PlatformSendSync: Send + Sync {}

impl<T> PlatformSendSync for T where T: Send + Sync + ?Sized {}
