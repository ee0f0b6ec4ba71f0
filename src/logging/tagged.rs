// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Tagged logger: one file per tag, rolled over by day or by hour.

use super::clock::Clock;
use super::engine::{report_error, BatchWriter, Logger};
use super::file::{update_symlink, LogFile, LogPaths};
use super::options::LogOptions;
use super::record::LogRecord;
use super::LogError;
use crate::thread::RwLock;
use chrono::{NaiveDate, TimeDelta, Timelike};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// Tags with this prefix roll over hourly unless told otherwise.
pub const HOURLY_TAG_PREFIX: &str = "klog_";

/// Prefix added to debug tags.
pub const DEBUG_TAG_PREFIX: &str = "dlog_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rollover {
    ByDay,
    ByHour,
}

impl Rollover {
    fn timestamp_format(self) -> &'static str {
        match self {
            Rollover::ByDay => "%Y%m%d",
            Rollover::ByHour => "%Y%m%d%H",
        }
    }

    fn default_for(tag: &str) -> Self {
        if tag.starts_with(HOURLY_TAG_PREFIX) {
            Rollover::ByHour
        } else {
            Rollover::ByDay
        }
    }
}

type Rollovers = Arc<RwLock<HashMap<String, Rollover>>>;

/// A tagged record: ` <file>:<line>] message\n`
#[derive(Debug)]
pub struct TaggedRecord {
    tag: Cow<'static, str>,
    body: LogRecord,
}

impl TaggedRecord {
    pub fn new(tag: impl Into<Cow<'static, str>>, file: &str, line: u32) -> Self {
        let mut body = LogRecord::with_capacity(128);
        let _ = write!(body, " {}:{}] ", file, line);
        Self {
            tag: tag.into(),
            body,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn body(&self) -> &LogRecord {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut LogRecord {
        &mut self.body
    }
}

pub(crate) struct TaggedWriter {
    paths: LogPaths,
    clock: Arc<dyn Clock>,
    lookahead: TimeDelta,
    files: HashMap<String, LogFile>,
    rollovers: Rollovers,
    day: NaiveDate,
    hour: u32,
}

impl TaggedWriter {
    fn new(options: &LogOptions, rollovers: Rollovers) -> Self {
        let lookahead = TimeDelta::from_std(options.tagged_interval).unwrap_or(TimeDelta::zero());
        let now = options.clock.now() + lookahead;
        Self {
            paths: options.paths(),
            clock: Arc::clone(&options.clock),
            lookahead,
            files: HashMap::new(),
            rollovers,
            day: now.date(),
            hour: now.hour(),
        }
    }
}

fn rollover_of(rollovers: &RwLock<HashMap<String, Rollover>>, tag: &str) -> Rollover {
    if let Some(r) = rollovers.read().get(tag) {
        return *r;
    }
    *rollovers
        .write()
        .entry(tag.to_string())
        .or_insert_with(|| Rollover::default_for(tag))
}

fn open_log_file(
    paths: &LogPaths,
    clock: &dyn Clock,
    rollover: Rollover,
    tag: &str,
    file: &mut LogFile,
) -> io::Result<()> {
    let stamp = clock.now().format(rollover.timestamp_format());
    let name = paths.file_name(&format!("_{}_{}.log", tag, stamp));
    file.open(paths.join(&name))?;

    let link = paths.join(&paths.file_name(&format!(".{}", tag)));
    if let Err(e) = update_symlink(&name, &link) {
        report_error(&format!("symlink {}", link.display()), &e);
    }
    Ok(())
}

impl BatchWriter for TaggedWriter {
    type Record = TaggedRecord;

    fn write_logs(&mut self, logs: &mut Vec<TaggedRecord>) {
        let time = self.clock.now().format("%Y-%m-%d %H:%M:%S").to_string();
        let mut failed = 0usize;
        let mut last_error = None;

        for record in logs.drain(..) {
            let file = self.files.entry(record.tag.to_string()).or_default();
            let result = (|| {
                if !file.is_open() {
                    let rollover = rollover_of(&self.rollovers, &record.tag);
                    open_log_file(&self.paths, &*self.clock, rollover, &record.tag, file)?;
                }
                file.write(time.as_bytes())?;
                file.write(record.body.data())
            })();
            if let Err(e) = result {
                failed += 1;
                last_error = Some(e);
            }
        }

        if let Some(e) = last_error {
            report_error(&format!("{} tagged record(s) not written", failed), &e);
        }
    }

    fn flush_log_files(&mut self) {
        let ahead = self.clock.now() + self.lookahead;
        let (day, hour) = (ahead.date(), ahead.hour());
        let day_changed = day != self.day;
        let hour_changed = day_changed || hour != self.hour;
        self.day = day;
        self.hour = hour;

        for (tag, file) in self.files.iter_mut() {
            if !file.is_open() {
                continue;
            }
            let crossed = match rollover_of(&self.rollovers, tag) {
                Rollover::ByDay => day_changed,
                Rollover::ByHour => hour_changed,
            };
            if crossed || !file.exists() {
                let _ = file.close();
            } else if let Err(e) = file.sync() {
                report_error(&format!("flush tagged log {}", tag), &e);
                let _ = file.close();
            }
        }
    }
}

/// The tagged logger: `<prefix><program>_<tag>_<stamp>.log`.
#[derive(Debug)]
pub struct TaggedLogger {
    engine: Logger<TaggedWriter>,
    rollovers: Rollovers,
}

impl TaggedLogger {
    pub fn new(options: &LogOptions) -> Result<Self, LogError> {
        let rollovers = Rollovers::default();
        let writer = TaggedWriter::new(options, Arc::clone(&rollovers));
        let engine = Logger::new("tagged-log", options.tagged_interval, writer)
            .map_err(LogError::Spawn)?;
        Ok(Self { engine, rollovers })
    }

    pub fn push(&self, record: TaggedRecord) {
        self.engine.push(record);
    }

    pub fn stop(&self) {
        self.engine.stop();
    }

    pub fn log_by_day(&self, tag: &str) {
        self.rollovers.write().insert(tag.to_string(), Rollover::ByDay);
    }

    pub fn log_by_hour(&self, tag: &str) {
        self.rollovers.write().insert(tag.to_string(), Rollover::ByHour);
    }

    pub fn rollover(&self, tag: &str) -> Rollover {
        rollover_of(&self.rollovers, tag)
    }

    pub fn interval(&self) -> Duration {
        self.engine.interval()
    }
}
