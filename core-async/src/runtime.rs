//! Runtime utilities that abstract over the underlying async executor.
//!
//! Downstream crates use [`Handle::try_current`] to detect whether they are
//! already inside a runtime and [`block_on`] when a synchronous caller needs
//! to drive a future to completion.

pub use tokio::runtime::{Builder, Handle, Runtime};

/// Runs the provided future to completion on a fresh current-thread runtime.
///
/// # Panics
///
/// Panics if called from within an async context, or if the runtime cannot
/// be built.
pub fn block_on<F>(future: F) -> F::Output
where
    F: std::future::Future,
{
    Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("core_async::runtime::block_on: failed to build Tokio runtime")
        .block_on(future)
}

/// Returns `true` when the caller is running inside an async runtime.
pub fn in_runtime() -> bool {
    Handle::try_current().is_ok()
}
