//! Runtime facade for the stream preload crates.
//!
//! Every other crate in the workspace reaches the async runtime through this
//! crate instead of naming Tokio directly. That keeps the executor choice in
//! one place and gives the preload scheduler a single vocabulary for tasks,
//! timers, locks and cancellation.
//!
//! # Modules
//!
//! - `task`: spawning concurrent work
//! - `time`: sleeps, deadlines and monotonic instants
//! - `sync`: async locks, channels and cooperative cancellation
//! - `runtime`: blocking entry points for synchronous callers
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::CancellationToken;
//! use core_async::time::{sleep, Duration};
//!
//! async fn example() {
//!     let token = CancellationToken::new();
//!     let child = token.child_token();
//!
//!     let handle = core_async::spawn(async move {
//!         child
//!             .run_until_cancelled(sleep(Duration::from_secs(60)))
//!             .await
//!             .is_none()
//!     });
//!
//!     token.cancel();
//!     assert!(handle.await.unwrap());
//! }
//! ```

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};
