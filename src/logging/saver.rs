// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Call-site guards behind the logging macros.
//!
//! A saver builds one record and hands it over when it is dropped (or on an
//! explicit `commit`). Without a logging context, records go straight to
//! stderr.

use super::context::{global, Logging};
use super::level::Level;
use super::leveled::LevelRecord;
use super::options::DLOG_ON;
use super::record::{Appendable, LogRecord};
use super::tagged::{TaggedRecord, DEBUG_TAG_PREFIX};
use super::telemetry::TelemetryRecord;
use chrono::Local;
use std::borrow::Cow;
use std::fmt::{self, Write as _};
use std::io::{self, Write};
use std::sync::Arc;

/// Where a saver delivers its record.
#[derive(Debug, Clone)]
pub enum LogTarget<'a> {
    Context(&'a Logging),
    Shared(Arc<Logging>),
    /// No context installed
    Stderr,
}

impl LogTarget<'static> {
    /// The globally installed context, or stderr.
    pub fn global() -> Self {
        match global() {
            Some(logging) => LogTarget::Shared(logging),
            None => LogTarget::Stderr,
        }
    }
}

impl<'a> LogTarget<'a> {
    pub fn logging(&self) -> Option<&Logging> {
        match self {
            LogTarget::Context(logging) => Some(*logging),
            LogTarget::Shared(logging) => Some(logging.as_ref()),
            LogTarget::Stderr => None,
        }
    }

    /// Whether debug tags are recorded.
    pub fn dlog_on(&self) -> bool {
        match self.logging() {
            Some(logging) => logging.dlog_on(),
            None => DLOG_ON.get(),
        }
    }
}

impl<'a> From<&'a Logging> for LogTarget<'a> {
    fn from(logging: &'a Logging) -> Self {
        LogTarget::Context(logging)
    }
}

impl<'a> From<&'a Arc<Logging>> for LogTarget<'a> {
    fn from(logging: &'a Arc<Logging>) -> Self {
        LogTarget::Context(logging.as_ref())
    }
}

impl From<Arc<Logging>> for LogTarget<'static> {
    fn from(logging: Arc<Logging>) -> Self {
        LogTarget::Shared(logging)
    }
}

/// Builds a severity record.
pub struct LevelLogSaver<'a> {
    target: LogTarget<'a>,
    record: Option<LevelRecord>,
}

impl<'a> LevelLogSaver<'a> {
    pub fn new(target: impl Into<LogTarget<'a>>, level: Level, file: &str, line: u32) -> Self {
        Self {
            target: target.into(),
            record: Some(LevelRecord::new(level, file, line)),
        }
    }

    pub fn put<T: Appendable>(&mut self, value: T) -> &mut Self {
        if let Some(record) = self.record.as_mut() {
            record.body_mut().put(value);
        }
        self
    }

    pub fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> &mut Self {
        if let Some(record) = self.record.as_mut() {
            let _ = record.body_mut().write_fmt(args);
        }
        self
    }

    /// Hand the record over now.
    pub fn commit(self) {}

    /// Take the FATAL path with this record, whatever its level.
    pub fn fatal(mut self) -> ! {
        let record = self
            .record
            .take()
            .unwrap_or_else(|| LevelRecord::new(Level::Fatal, "", 0));
        let record = promote(record);
        submit_level(&self.target, record);
        std::process::exit(0)
    }
}

impl Drop for LevelLogSaver<'_> {
    fn drop(&mut self) {
        if let Some(record) = self.record.take() {
            submit_level(&self.target, record);
        }
    }
}

fn promote(record: LevelRecord) -> LevelRecord {
    if record.level() == Level::Fatal {
        return record;
    }
    let mut fatal = LevelRecord::new(Level::Fatal, "", 0);
    fatal.body_mut().clear();
    fatal.body_mut().append(record.body().data());
    fatal
}

fn submit_level(target: &LogTarget<'_>, mut record: LevelRecord) {
    record.body_mut().put('\n');
    match target.logging() {
        Some(logging) => logging.push_level(record),
        None => {
            let time = Local::now().format("%m%d %H:%M:%S").to_string();
            let mut err = io::stderr().lock();
            let _ = err.write_all(&[record.level().as_char()]);
            let _ = err.write_all(time.as_bytes());
            let _ = err.write_all(record.body().data());
            if record.level() == Level::Fatal {
                drop(err);
                std::process::exit(0);
            }
        }
    }
}

/// Builds a tagged record.
pub struct TaggedLogSaver<'a> {
    target: LogTarget<'a>,
    record: Option<TaggedRecord>,
}

impl<'a> TaggedLogSaver<'a> {
    pub fn new(
        target: impl Into<LogTarget<'a>>,
        tag: impl Into<Cow<'static, str>>,
        file: &str,
        line: u32,
    ) -> Self {
        Self {
            target: target.into(),
            record: Some(TaggedRecord::new(tag, file, line)),
        }
    }

    /// A debug record for `tag`, stored under `dlog_<tag>`. Returns `None`
    /// when debug logging is off.
    pub fn debug(target: impl Into<LogTarget<'a>>, tag: &str, file: &str, line: u32) -> Option<Self> {
        let target = target.into();
        if !target.dlog_on() {
            return None;
        }
        let tag = format!("{}{}", DEBUG_TAG_PREFIX, tag);
        Some(Self::new(target, tag, file, line))
    }

    pub fn put<T: Appendable>(&mut self, value: T) -> &mut Self {
        if let Some(record) = self.record.as_mut() {
            record.body_mut().put(value);
        }
        self
    }

    pub fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> &mut Self {
        if let Some(record) = self.record.as_mut() {
            let _ = record.body_mut().write_fmt(args);
        }
        self
    }

    pub fn commit(self) {}
}

impl Drop for TaggedLogSaver<'_> {
    fn drop(&mut self) {
        let Some(mut record) = self.record.take() else {
            return;
        };
        record.body_mut().put('\n');
        match self.target.logging() {
            Some(logging) => logging.push_tagged(record),
            None => {
                let time = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
                let mut err = io::stderr().lock();
                let _ = write!(err, "[{}] {}", record.tag(), time);
                let _ = err.write_all(record.body().data());
            }
        }
    }
}

/// Builds a telemetry record, one `&`-terminated field per `put`.
pub struct TelemetryLogSaver<'a> {
    target: LogTarget<'a>,
    record: Option<TelemetryRecord>,
}

impl<'a> TelemetryLogSaver<'a> {
    pub fn new(target: impl Into<LogTarget<'a>>, topic: impl Into<Cow<'static, str>>) -> Self {
        Self {
            target: target.into(),
            record: Some(TelemetryRecord::new(topic)),
        }
    }

    pub fn put<T: Appendable>(&mut self, value: T) -> &mut Self {
        if let Some(record) = self.record.as_mut() {
            record.put(value);
        }
        self
    }

    pub fn commit(self) {}
}

impl Drop for TelemetryLogSaver<'_> {
    fn drop(&mut self) {
        let Some(mut record) = self.record.take() else {
            return;
        };
        record.finish();
        match self.target.logging() {
            Some(logging) => logging.push_telemetry(record),
            None => {
                let mut err = io::stderr().lock();
                let _ = write!(err, "[{}] ", record.topic());
                let _ = err.write_all(record.payload());
            }
        }
    }
}

/// Writes `file:line] message\n` to stderr when dropped, unbuffered.
pub struct StderrLogSaver {
    record: LogRecord,
}

impl StderrLogSaver {
    pub fn new(file: &str, line: u32) -> Self {
        let mut record = LogRecord::with_capacity(128);
        let _ = write!(record, "{}:{}] ", file, line);
        Self { record }
    }

    pub fn put<T: Appendable>(&mut self, value: T) -> &mut Self {
        self.record.put(value);
        self
    }

    pub fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> &mut Self {
        let _ = self.record.write_fmt(args);
        self
    }

    pub fn commit(self) {}
}

impl Drop for StderrLogSaver {
    fn drop(&mut self) {
        self.record.put('\n');
        let _ = io::stderr().lock().write_all(self.record.data());
    }
}
