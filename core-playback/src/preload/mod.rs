//! # Preload Module
//!
//! Warms a sliding window of queue items around the playback position so
//! that skipping forward or back starts from local bytes.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │     PreloadScheduler         │
//! │  - update_window()           │
//! │  - is_warmed()               │
//! │  - cancel_all() / release()  │
//! └────────┬─────────────────────┘
//!          │ one job per key
//!          ├──> ResolutionCoordinator ──> StreamUrlCache
//!          │                         └──> StreamResolver (host)
//!          └──> ByteRangeCache (host)
//! ```
//!
//! Observers read [`PreloadSnapshot`]s through a `watch` channel; each
//! snapshot is published whole, after the transition it describes.

mod job;
mod scheduler;
mod snapshot;
mod window;

pub use job::{JobPhase, PreloadJobId};
pub use scheduler::PreloadScheduler;
pub use snapshot::{PreloadSnapshot, WindowUpdate};
pub use window::{plan_window, PreloadEligibility, PreloadTarget, RemoteOnly, TargetRole};
