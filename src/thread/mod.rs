// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Thread primitives shared by the logging and flag subsystems.
//!
//! - [`SpinLock`]: `spin`'s busy-wait mutex, usable from signal context via
//!   `try_lock` (a single compare-and-swap)
//! - [`SyncEvent`]: manual/auto-reset event with bounded wait
//! - [`Thread`] / [`StoppableThread`]: one-shot and periodic background workers
//!
//! Blocking mutexes and reader-writer locks are `parking_lot`'s, re-exported
//! here so callers get non-poisoning scoped guards from one place.

mod event;
mod stoppable;

pub use event::SyncEvent;
pub use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
pub use spin::{Mutex as SpinLock, MutexGuard as SpinLockGuard};
pub use stoppable::{StoppableThread, Thread};
