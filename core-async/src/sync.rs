//! Synchronization primitives.
//!
//! Async-aware locks and channels for state that is shared across tasks, plus
//! [`CancellationToken`] for cooperative cancellation. Tokens form a tree:
//! cancelling a parent cancels every child created with
//! [`CancellationToken::child_token`], which is how a scheduler-wide scope
//! tears down all of its per-item jobs at once.
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::{watch, CancellationToken};
//!
//! let (tx, rx) = watch::channel(0u32);
//! tx.send_replace(1);
//! assert_eq!(*rx.borrow(), 1);
//!
//! let scope = CancellationToken::new();
//! let job = scope.child_token();
//! scope.cancel();
//! assert!(job.is_cancelled());
//! ```

pub use tokio::sync::{
    broadcast, mpsc, oneshot, watch, Mutex, MutexGuard, Notify, RwLock, RwLockReadGuard,
    RwLockWriteGuard, Semaphore, SemaphorePermit,
};

pub use tokio_util::sync::{CancellationToken, DropGuard, WaitForCancellationFuture};
