// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Telemetry logger: `&`-separated records handed to application callbacks.
//!
//! Nothing is written to disk. Each tick the batch is formatted as
//! `<ip>&<YYYY-mm-dd HH:MM:SS>&<v1>&<v2>&...&\n` and passed, with its topic,
//! to the log callback. Records reaching the writer while no log callback is
//! registered are dropped and counted.

use super::clock::Clock;
use super::engine::{BatchWriter, Logger};
use super::options::LogOptions;
use super::record::{Appendable, LogRecord};
use super::LogError;
use crate::thread::RwLock;
use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Receives `(topic, line)` for every telemetry record.
pub type LogCallback = Arc<dyn Fn(&str, &[u8]) + Send + Sync>;

/// Flush and failure hooks.
pub type HookCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Callbacks {
    log: Option<LogCallback>,
    flush: Option<HookCallback>,
    failure: Option<HookCallback>,
}

/// A telemetry record under construction.
#[derive(Debug)]
pub struct TelemetryRecord {
    topic: Cow<'static, str>,
    body: LogRecord,
}

impl TelemetryRecord {
    pub fn new(topic: impl Into<Cow<'static, str>>) -> Self {
        Self {
            topic: topic.into(),
            body: LogRecord::with_capacity(128),
        }
    }

    /// Append one field followed by `&`.
    pub fn put<T: Appendable>(&mut self, value: T) -> &mut Self {
        self.body.put(value).put('&');
        self
    }

    /// Terminate the record.
    pub fn finish(&mut self) {
        self.body.put('\n');
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn payload(&self) -> &[u8] {
        self.body.data()
    }
}

pub(crate) struct TelemetryWriter {
    callbacks: Arc<RwLock<Callbacks>>,
    clock: Arc<dyn Clock>,
    ip: String,
    dropped: Arc<AtomicU64>,
    line: Vec<u8>,
}

impl BatchWriter for TelemetryWriter {
    type Record = TelemetryRecord;

    fn write_logs(&mut self, logs: &mut Vec<TelemetryRecord>) {
        let Some(callback) = self.callbacks.read().log.clone() else {
            self.dropped.fetch_add(logs.len() as u64, Ordering::Relaxed);
            logs.clear();
            return;
        };

        let time = self.clock.now().format("%Y-%m-%d %H:%M:%S").to_string();
        for record in logs.drain(..) {
            self.line.clear();
            self.line.extend_from_slice(self.ip.as_bytes());
            self.line.push(b'&');
            self.line.extend_from_slice(time.as_bytes());
            self.line.push(b'&');
            self.line.extend_from_slice(record.payload());
            callback(record.topic(), self.line.as_slice());
        }
    }

    fn flush_log_files(&mut self) {
        let flush = self.callbacks.read().flush.clone();
        if let Some(flush) = flush {
            flush();
        }
    }

    fn on_stop(&mut self) {
        let failure = self.callbacks.read().failure.clone();
        if let Some(failure) = failure {
            failure();
        }
    }
}

/// The telemetry logger.
pub struct TelemetryLogger {
    engine: Logger<TelemetryWriter>,
    callbacks: Arc<RwLock<Callbacks>>,
    dropped: Arc<AtomicU64>,
}

impl TelemetryLogger {
    pub fn new(options: &LogOptions) -> Result<Self, LogError> {
        let callbacks = Arc::new(RwLock::new(Callbacks::default()));
        let dropped = Arc::new(AtomicU64::new(0));
        let writer = TelemetryWriter {
            callbacks: Arc::clone(&callbacks),
            clock: Arc::clone(&options.clock),
            ip: options.ip.clone(),
            dropped: Arc::clone(&dropped),
            line: Vec::with_capacity(256),
        };
        let engine = Logger::new("telemetry-log", options.telemetry_interval, writer)
            .map_err(LogError::Spawn)?;
        Ok(Self {
            engine,
            callbacks,
            dropped,
        })
    }

    pub fn push(&self, record: TelemetryRecord) {
        self.engine.push(record);
    }

    /// Runs the failure callback, then drains.
    pub fn stop(&self) {
        self.engine.stop();
    }

    pub fn set_log_callback<F>(&self, callback: F)
    where
        F: Fn(&str, &[u8]) + Send + Sync + 'static,
    {
        self.callbacks.write().log = Some(Arc::new(callback));
    }

    pub fn set_flush_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.callbacks.write().flush = Some(Arc::new(callback));
    }

    pub fn set_failure_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.callbacks.write().failure = Some(Arc::new(callback));
    }

    /// Records discarded because no log callback was registered.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for TelemetryLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryLogger")
            .field("engine", &self.engine)
            .field("dropped", &self.dropped())
            .finish()
    }
}
