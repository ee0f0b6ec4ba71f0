// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Double-buffered drain engine shared by every logger.
//!
//! Producers push finished records into the active queue under a short lock.
//! A [`StoppableThread`] wakes once per interval, swaps the active queue with
//! its private batch, releases the lock and hands the batch to the
//! [`BatchWriter`] outside of it, then asks the writer to flush.

use crate::thread::{Mutex, StoppableThread};
use chrono::Local;
use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Batches larger than this are shrunk back after being written.
pub const BATCH_RESERVE: usize = 1024;

/// Destination side of a [`Logger`].
pub trait BatchWriter: Send + 'static {
    type Record: Send + 'static;

    /// Persist or forward every record in `logs`. Records are dropped after
    /// their write attempt whether or not it succeeded.
    fn write_logs(&mut self, logs: &mut Vec<Self::Record>);

    /// Flush and apply rollover. Runs once per tick, even on empty batches.
    fn flush_log_files(&mut self);

    /// First step of [`Logger::stop`], before the thread is joined.
    fn on_stop(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EngineState {
    Running = 0,
    Draining = 1,
    Stopped = 2,
}

impl EngineState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Running,
            1 => Self::Draining,
            _ => Self::Stopped,
        }
    }
}

struct Shared<W: BatchWriter> {
    queue: Mutex<Vec<W::Record>>,
    writer: Mutex<W>,
}

impl<W: BatchWriter> Shared<W> {
    fn tick(&self, batch: &mut Vec<W::Record>) {
        {
            let mut queue = self.queue.lock();
            if !queue.is_empty() {
                std::mem::swap(&mut *queue, batch);
            }
        }

        let mut writer = self.writer.lock();
        if !batch.is_empty() {
            writer.write_logs(batch);
            batch.clear();
            if batch.capacity() > BATCH_RESERVE {
                batch.shrink_to(BATCH_RESERVE);
            }
        }
        writer.flush_log_files();
    }

    fn drain(&self) {
        let mut writer = self.writer.lock();
        let mut logs = std::mem::take(&mut *self.queue.lock());
        if !logs.is_empty() {
            writer.write_logs(&mut logs);
            writer.flush_log_files();
        }
    }
}

/// A buffered logger with its own background thread.
pub struct Logger<W: BatchWriter> {
    shared: Arc<Shared<W>>,
    thread: StoppableThread,
    state: AtomicU8,
}

impl<W: BatchWriter> Logger<W> {
    /// Start the background thread named `name`, ticking every `interval`.
    pub fn new(name: &str, interval: Duration, writer: W) -> io::Result<Self> {
        let shared = Arc::new(Shared {
            queue: Mutex::new(Vec::with_capacity(BATCH_RESERVE)),
            writer: Mutex::new(writer),
        });

        let worker = Arc::clone(&shared);
        let mut batch = Vec::with_capacity(BATCH_RESERVE);
        let thread = StoppableThread::spawn(name, interval, move || worker.tick(&mut batch))?;

        Ok(Self {
            shared,
            thread,
            state: AtomicU8::new(EngineState::Running as u8),
        })
    }

    /// Queue a record for the next tick.
    pub fn push(&self, record: W::Record) {
        self.shared.queue.lock().push(record);
    }

    /// Stop the thread and write whatever is still queued.
    ///
    /// Safe to call more than once. Records pushed after a stop are written
    /// by the next call (or on drop).
    pub fn stop(&self) {
        self.state
            .store(EngineState::Draining as u8, Ordering::Release);
        self.shared.writer.lock().on_stop();
        self.thread.join();
        self.shared.drain();
        self.state.store(EngineState::Stopped as u8, Ordering::Release);
    }

    pub fn state(&self) -> EngineState {
        EngineState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn interval(&self) -> Duration {
        self.thread.period()
    }

    /// Records waiting for the next tick.
    pub fn pending(&self) -> usize {
        self.shared.queue.lock().len()
    }

    /// Wake the background thread for an early tick.
    pub fn notify(&self) {
        self.thread.notify();
    }

    /// Run `f` with exclusive access to the writer.
    pub fn with_writer<R>(&self, f: impl FnOnce(&mut W) -> R) -> R {
        f(&mut self.shared.writer.lock())
    }
}

impl<W: BatchWriter> Drop for Logger<W> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<W: BatchWriter> fmt::Debug for Logger<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("state", &self.state())
            .field("interval", &self.interval())
            .finish_non_exhaustive()
    }
}

/// Report a writer failure on stderr, in the severity line layout.
pub(crate) fn report_error(context: &str, err: &dyn fmt::Display) {
    let time = Local::now().format("%m%d %H:%M:%S");
    let _ = writeln!(io::stderr().lock(), "W{} ccbase: {}: {}", time, context, err);
}
