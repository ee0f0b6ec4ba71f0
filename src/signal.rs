// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Process-wide signal dispatcher.
//!
//! Several components may need cleanup on the same signal (the loggers flush
//! on SIGTERM, the crash handler reports on SIGSEGV, an application may have
//! its own handler). The dispatcher keeps one ordered callback chain per
//! signal and installs a single OS handler for it.
//!
//! On delivery the chain runs most-recently-added first, the disposition is
//! reset to `SIG_DFL` and the signal is raised again, so the process still
//! terminates (or dumps core) with the expected signal semantics.
//!
//! The chain table is the only state touched from signal context. The OS
//! handler only ever calls `try_lock` on it: if a signal lands while another
//! thread is registering a callback, the callbacks are skipped and the signal
//! is re-raised immediately.

use crate::thread::SpinLock;
use nix::errno::Errno;
use nix::sys::signal::{self as nix_signal, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd::Pid;
use std::collections::BTreeMap;
use thiserror::Error;

type Callback = Box<dyn FnOnce() + Send + 'static>;
type InfoHandler = extern "C" fn(libc::c_int, *mut libc::siginfo_t, *mut libc::c_void);

enum Entry {
    Callback(Callback),
    /// Plain handler found in place by the first registration
    Plain(extern "C" fn(libc::c_int)),
    /// `SA_SIGINFO` handler found in place by the first registration
    Info(InfoHandler),
}

static CHAINS: SpinLock<BTreeMap<i32, Vec<Entry>>> = SpinLock::new(BTreeMap::new());

/// Errors from installing signal dispositions.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("failed to change disposition of {signal}: {source}")]
    Sigaction {
        signal: Signal,
        #[source]
        source: Errno,
    },
    #[error("failed to raise {signal}: {source}")]
    Raise {
        signal: Signal,
        #[source]
        source: Errno,
    },
}

/// Current OS disposition of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Default,
    Ignore,
    /// Any installed handler, including the dispatcher's own.
    Handler,
}

/// Append `callback` to the chain for `signal`.
///
/// The first registration for a signal installs the dispatcher as OS handler.
/// A handler installed earlier by someone else (plain or `SA_SIGINFO`) is
/// kept as the first (and therefore last to run) entry of the chain, and its
/// `SA_ONSTACK` flag carries over to the dispatcher.
pub fn add_handler<F>(signal: Signal, callback: F) -> Result<(), SignalError>
where
    F: FnOnce() + Send + 'static,
{
    let signum = signal as i32;
    {
        let mut chains = CHAINS.lock();
        if let Some(chain) = chains.get_mut(&signum) {
            chain.push(Entry::Callback(Box::new(callback)));
            return Ok(());
        }
    }

    let dispatcher = SigHandler::SigAction(on_signal);
    let previous = set_disposition(signal, dispatcher, SaFlags::SA_SIGINFO)?;
    if previous.flags().contains(SaFlags::SA_ONSTACK) {
        set_disposition(signal, dispatcher, SaFlags::SA_SIGINFO | SaFlags::SA_ONSTACK)?;
    }

    let mut chains = CHAINS.lock();
    let chain = chains.entry(signum).or_default();
    match previous.handler() {
        SigHandler::Handler(handler) => chain.insert(0, Entry::Plain(handler)),
        SigHandler::SigAction(handler) if handler as usize != on_signal as usize => {
            chain.insert(0, Entry::Info(handler))
        }
        _ => {}
    }
    chain.push(Entry::Callback(Box::new(callback)));
    Ok(())
}

/// Drop every callback for `signal` and restore the default disposition.
pub fn del_handler(signal: Signal) -> Result<(), SignalError> {
    CHAINS.lock().remove(&(signal as i32));
    reset(signal)
}

/// Set the disposition of `signal` to `SIG_IGN`.
pub fn ignore(signal: Signal) -> Result<(), SignalError> {
    set_disposition(signal, SigHandler::SigIgn, SaFlags::empty()).map(|_| ())
}

/// Set the disposition of `signal` to `SIG_DFL`.
pub fn reset(signal: Signal) -> Result<(), SignalError> {
    set_disposition(signal, SigHandler::SigDfl, SaFlags::empty()).map(|_| ())
}

/// Send `signal` to the current process.
pub fn raise(signal: Signal) -> Result<(), SignalError> {
    nix_signal::kill(Pid::this(), signal).map_err(|source| SignalError::Raise { signal, source })
}

/// Number of callbacks chained on `signal`.
pub fn handler_count(signal: Signal) -> usize {
    CHAINS
        .lock()
        .get(&(signal as i32))
        .map_or(0, |chain| chain.len())
}

/// Query the OS disposition of `signal` without changing it.
pub fn disposition(signal: Signal) -> Disposition {
    // SAFETY: a null `act` only reads the current action into `old`
    let handler = unsafe {
        let mut old: libc::sigaction = std::mem::zeroed();
        if libc::sigaction(signal as libc::c_int, std::ptr::null(), &mut old) != 0 {
            return Disposition::Default;
        }
        old.sa_sigaction
    };
    match handler {
        libc::SIG_DFL => Disposition::Default,
        libc::SIG_IGN => Disposition::Ignore,
        _ => Disposition::Handler,
    }
}

fn set_disposition(
    signal: Signal,
    handler: SigHandler,
    flags: SaFlags,
) -> Result<SigAction, SignalError> {
    let action = SigAction::new(handler, flags, SigSet::empty());
    // SAFETY: the only handler installed is `on_signal`, which only touches
    // the chain table through `try_lock`
    unsafe { nix_signal::sigaction(signal, &action) }
        .map_err(|source| SignalError::Sigaction { signal, source })
}

extern "C" fn on_signal(
    signum: libc::c_int,
    info: *mut libc::siginfo_t,
    ucontext: *mut libc::c_void,
) {
    let chain = CHAINS.try_lock().and_then(|mut chains| chains.remove(&signum));
    if let Some(chain) = chain {
        for entry in chain.into_iter().rev() {
            match entry {
                Entry::Callback(callback) => callback(),
                Entry::Plain(handler) => handler(signum),
                Entry::Info(handler) => handler(signum, info, ucontext),
            }
        }
    }

    // SAFETY: sigaction and kill are async-signal-safe
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = libc::SIG_DFL;
        libc::sigemptyset(&mut action.sa_mask);
        libc::sigaction(signum, &action, std::ptr::null_mut());
        libc::kill(libc::getpid(), signum);
    }
}
