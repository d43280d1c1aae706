//! Time-related abstractions.
//!
//! Re-exports the runtime's timer primitives alongside the std duration and
//! instant types. [`timeout`] is the deadline used for every bounded network
//! call in the workspace.
//!
//! ```rust
//! use core_async::time::{timeout, sleep, Duration};
//!
//! async fn example() {
//!     let result = timeout(Duration::from_millis(10), sleep(Duration::from_secs(1))).await;
//!     assert!(result.is_err());
//! }
//! ```

pub use tokio::time::{
    error::Elapsed, interval, sleep, sleep_until, timeout, Interval, Sleep, Timeout,
};

pub use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Returns the current time as milliseconds since UNIX_EPOCH.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
