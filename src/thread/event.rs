// SPDX-License-Identifier: Apache-2.0 OR MIT
// Manual/auto-reset event built on a condition variable

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Event for thread startup/shutdown rendezvous.
///
/// An auto-reset event clears itself when a waiter consumes the signal;
/// a manual-reset event stays signaled until [`SyncEvent::reset`].
pub struct SyncEvent {
    signaled: Mutex<bool>,
    cond: Condvar,
    manual_reset: bool,
}

impl SyncEvent {
    pub fn new(manual_reset: bool, signaled: bool) -> Self {
        Self {
            signaled: Mutex::new(signaled),
            cond: Condvar::new(),
            manual_reset,
        }
    }

    pub fn signal(&self) {
        let mut signaled = self.signaled.lock();
        if !*signaled {
            *signaled = true;
            self.cond.notify_all();
        }
    }

    pub fn reset(&self) {
        *self.signaled.lock() = false;
    }

    pub fn is_signaled(&self) -> bool {
        *self.signaled.lock()
    }

    /// Block until signaled.
    pub fn wait(&self) {
        let mut signaled = self.signaled.lock();
        while !*signaled {
            self.cond.wait(&mut signaled);
        }
        if !self.manual_reset {
            *signaled = false;
        }
    }

    /// Block until signaled or until `timeout` elapses.
    ///
    /// Returns false on timeout.
    pub fn timed_wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut signaled = self.signaled.lock();
        while !*signaled {
            if self.cond.wait_until(&mut signaled, deadline).timed_out() {
                if !*signaled {
                    return false;
                }
                break;
            }
        }
        if !self.manual_reset {
            *signaled = false;
        }
        true
    }
}

impl Default for SyncEvent {
    fn default() -> Self {
        Self::new(false, false)
    }
}
