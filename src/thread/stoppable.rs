// SPDX-License-Identifier: Apache-2.0 OR MIT
// Background worker threads

use super::SyncEvent;
use parking_lot::Mutex;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

type ThreadFn = Box<dyn FnOnce() + Send + 'static>;

/// Named thread that is started at most once and joined at most once.
pub struct Thread {
    name: String,
    fun: Mutex<Option<ThreadFn>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Thread {
    pub fn new<F>(name: impl Into<String>, fun: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            name: name.into(),
            fun: Mutex::new(Some(Box::new(fun))),
            handle: Mutex::new(None),
        }
    }

    /// Spawn the thread. Starting an already started thread is a no-op.
    pub fn start(&self) -> io::Result<()> {
        let Some(fun) = self.fun.lock().take() else {
            return Ok(());
        };
        let handle = std::thread::Builder::new()
            .name(self.name.clone())
            .spawn(fun)?;
        *self.handle.lock() = Some(handle);
        Ok(())
    }

    /// Wait for the thread to finish.
    ///
    /// Joining from the thread itself detaches instead of deadlocking.
    pub fn join(&self) {
        let Some(handle) = self.handle.lock().take() else {
            return;
        };
        if handle.thread().id() == std::thread::current().id() {
            return;
        }
        // A panicking worker has already printed its message
        let _ = handle.join();
    }

    pub fn detach(&self) {
        self.handle.lock().take();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

struct StopState {
    event: SyncEvent,
    stop: AtomicBool,
}

/// Runs a function every `period` until joined.
///
/// The sleep between runs is a bounded wait on a [`SyncEvent`], so
/// [`notify`](StoppableThread::notify) can start the next run early.
pub struct StoppableThread {
    state: Arc<StopState>,
    thread: Thread,
    period: Duration,
}

impl StoppableThread {
    pub fn spawn<F>(name: impl Into<String>, period: Duration, mut fun: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let state = Arc::new(StopState {
            event: SyncEvent::default(),
            stop: AtomicBool::new(false),
        });

        let worker_state = Arc::clone(&state);
        let thread = Thread::new(name, move || {
            while !worker_state.stop.load(Ordering::Acquire) {
                worker_state.event.timed_wait(period);
                if !worker_state.stop.load(Ordering::Acquire) {
                    fun();
                }
            }
        });
        thread.start()?;

        Ok(Self {
            state,
            thread,
            period,
        })
    }

    /// Stop the loop and wait for the thread. Only the first call has effect.
    pub fn join(&self) {
        if !self.state.stop.swap(true, Ordering::AcqRel) {
            self.state.event.signal();
            self.thread.join();
        }
    }

    /// Wake the worker without stopping it.
    pub fn notify(&self) {
        self.state.event.signal();
    }

    pub fn is_stopped(&self) -> bool {
        self.state.stop.load(Ordering::Acquire)
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Drop for StoppableThread {
    fn drop(&mut self) {
        self.join();
    }
}
