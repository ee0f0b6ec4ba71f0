// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Crash reporting for SIGSEGV, SIGFPE, SIGBUS, SIGILL and SIGABRT.
//!
//! On a fault the registered callback runs once (typically closing the
//! loggers and pointing the report at the FATAL file), then a short report
//! is written with `write(2)` to the report descriptor and to stderr. The
//! dispatcher then restores the default action and re-raises, so the process
//! still dumps core.

use crate::signal::{self, SignalError};
use crate::thread::SpinLock;
use nix::sys::signal::Signal;
use std::os::unix::io::RawFd;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

pub const FAULT_SIGNALS: [Signal; 5] = [
    Signal::SIGSEGV,
    Signal::SIGFPE,
    Signal::SIGBUS,
    Signal::SIGILL,
    Signal::SIGABRT,
];

type FailureCallback = Box<dyn FnOnce() + Send>;

static INSTALLED: AtomicBool = AtomicBool::new(false);
static REPORT_FD: AtomicI32 = AtomicI32::new(-1);
static CALLBACK: SpinLock<Option<FailureCallback>> = SpinLock::new(None);

/// Handle on the process-wide crash handler.
#[derive(Debug)]
pub struct FailureHandler {
    _private: (),
}

impl FailureHandler {
    /// Chain the crash report on every fault signal. Installing twice
    /// returns a handle to the same handler.
    pub fn install() -> Result<Self, SignalError> {
        if !INSTALLED.swap(true, Ordering::AcqRel) {
            for sig in FAULT_SIGNALS {
                if let Err(e) = signal::add_handler(sig, move || on_fault(sig)) {
                    INSTALLED.store(false, Ordering::Release);
                    return Err(e);
                }
            }
        }
        Ok(Self { _private: () })
    }

    /// Run `callback` (once) before the report is written.
    pub fn set_callback<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        *CALLBACK.lock() = Some(Box::new(callback));
    }

    pub fn clear_callback(&self) {
        CALLBACK.lock().take();
    }

    /// Also write the report to `fd`.
    pub fn set_fd(&self, fd: Option<RawFd>) {
        set_report_fd(fd);
    }

    pub fn fd(&self) -> Option<RawFd> {
        match REPORT_FD.load(Ordering::Acquire) {
            -1 => None,
            fd => Some(fd),
        }
    }
}

pub(crate) fn set_report_fd(fd: Option<RawFd>) {
    REPORT_FD.store(fd.unwrap_or(-1), Ordering::Release);
}

fn on_fault(sig: Signal) {
    let callback = CALLBACK.try_lock().and_then(|mut slot| slot.take());
    if let Some(callback) = callback {
        callback();
    }

    let fd = REPORT_FD.load(Ordering::Acquire);
    for part in [b"*** ".as_slice(), sig.as_str().as_bytes(), b" received, aborting ***\n"] {
        if fd >= 0 {
            write_all(fd, part);
        }
        write_all(libc::STDERR_FILENO, part);
    }
}

fn write_all(fd: RawFd, mut data: &[u8]) {
    while !data.is_empty() {
        // SAFETY: write(2) is async-signal-safe and `data` is a valid slice
        let n = unsafe { libc::write(fd, data.as_ptr().cast(), data.len()) };
        if n <= 0 {
            return;
        }
        data = &data[n as usize..];
    }
}
