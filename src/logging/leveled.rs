// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Severity logger: one file per level, cascading writes, daily and
//! size-based rotation.
//!
//! A record of level L is appended to the files of every level from INFO up
//! to L, so the INFO file holds everything and the ERROR file only errors.
//! FATAL records never go through the queue; see [`LevelLogger::write_fatal`].

use super::clock::Clock;
use super::engine::{report_error, BatchWriter, Logger};
use super::file::{update_symlink, LogFile, LogPaths};
use super::level::Level;
use super::options::{Destination, LogOptions};
use super::record::{current_thread_id, LogRecord};
use super::LogError;
use chrono::NaiveDate;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::os::unix::io::RawFd;
use std::sync::Arc;

const LEVELS: usize = Level::ALL.len();

/// A severity record: ` <tid> <file>:<line>] message\n`
#[derive(Debug)]
pub struct LevelRecord {
    level: Level,
    body: LogRecord,
}

impl LevelRecord {
    pub fn new(level: Level, file: &str, line: u32) -> Self {
        let mut body = LogRecord::with_capacity(128);
        let _ = write!(body, " {} {}:{}] ", current_thread_id(), file, line);
        Self { level, body }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn body(&self) -> &LogRecord {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut LogRecord {
        &mut self.body
    }
}

pub(crate) struct LevelWriter {
    paths: LogPaths,
    clock: Arc<dyn Clock>,
    files: [LogFile; LEVELS],
    index: [u32; LEVELS],
    day: NaiveDate,
    max_file_size: u64,
    destination: Destination,
}

impl LevelWriter {
    fn new(options: &LogOptions) -> Self {
        Self {
            paths: options.paths(),
            clock: Arc::clone(&options.clock),
            files: Default::default(),
            index: [0; LEVELS],
            day: options.clock.now().date(),
            max_file_size: options.max_file_size,
            destination: options.destination,
        }
    }

    fn now_text(&self) -> String {
        self.clock.now().format("%m%d %H:%M:%S").to_string()
    }

    /// Open today's file for `level`, skipping names already taken on disk.
    fn open_log_file(&mut self, level: Level) -> io::Result<()> {
        let i = level.index();
        let date = self.clock.now().format("%Y%m%d").to_string();
        let base = self.paths.file_name(&format!(".{}", date));

        let mut name = match self.index[i] {
            0 => format!("{}.{}", base, level.as_str()),
            n => format!("{}_{}.{}", base, n, level.as_str()),
        };
        while self.paths.join(&name).exists() {
            self.index[i] += 1;
            name = format!("{}_{}.{}", base, self.index[i], level.as_str());
        }

        self.files[i].open(self.paths.join(&name))?;

        let link = self.paths.join(&self.paths.file_name(&format!(".{}", level.as_str())));
        if let Err(e) = update_symlink(&name, &link) {
            report_error(&format!("symlink {}", link.display()), &e);
        }
        Ok(())
    }

    fn write_line(&mut self, file_level: Level, time: &str, record: &LevelRecord) -> io::Result<()> {
        let i = file_level.index();
        if !self.files[i].is_open() {
            self.open_log_file(file_level)?;
        }
        let file = &mut self.files[i];
        file.write(&[record.level.as_char()])?;
        file.write(time.as_bytes())?;
        file.write(record.body.data())
    }

    fn log_to_file(&mut self, time: &str, record: &LevelRecord) -> io::Result<()> {
        for level in record.level.cascade() {
            self.write_line(level, time, record)?;
        }
        Ok(())
    }

    fn log_to_stderr(time: &str, record: &LevelRecord) {
        let mut err = io::stderr().lock();
        let _ = err.write_all(&[record.level.as_char()]);
        let _ = err.write_all(time.as_bytes());
        let _ = err.write_all(record.body.data());
    }

    /// Synchronously write a FATAL record to the FATAL file and stderr.
    /// Returns the FATAL file's descriptor when it could be opened.
    pub(crate) fn write_fatal(&mut self, record: &LevelRecord) -> Option<RawFd> {
        let time = self.now_text();
        let line = self
            .write_line(Level::Fatal, &time, record)
            .and_then(|()| self.files[Level::Fatal.index()].sync());
        if let Err(e) = line {
            report_error("write FATAL log", &e);
        }
        Self::log_to_stderr(&time, record);
        self.fatal_fd()
    }

    /// Append raw text to the FATAL file.
    pub(crate) fn write_fatal_note(&mut self, note: &str) {
        let i = Level::Fatal.index();
        let result = (|| {
            if !self.files[i].is_open() {
                self.open_log_file(Level::Fatal)?;
            }
            self.files[i].write(note.as_bytes())?;
            self.files[i].sync()
        })();
        if let Err(e) = result {
            report_error("write FATAL log", &e);
        }
    }

    /// Descriptor of the FATAL file, opening it when needed.
    pub(crate) fn fatal_fd(&mut self) -> Option<RawFd> {
        let i = Level::Fatal.index();
        if !self.files[i].is_open() {
            if let Err(e) = self.open_log_file(Level::Fatal) {
                report_error("open FATAL log", &e);
                return None;
            }
        }
        self.files[i].raw_fd()
    }
}

impl BatchWriter for LevelWriter {
    type Record = LevelRecord;

    fn write_logs(&mut self, logs: &mut Vec<LevelRecord>) {
        let time = self.now_text();
        let mut failed = 0usize;
        let mut last_error = None;

        for record in logs.drain(..) {
            if self.destination.to_stderr() {
                Self::log_to_stderr(&time, &record);
            }
            if self.destination.to_file() {
                if let Err(e) = self.log_to_file(&time, &record) {
                    failed += 1;
                    last_error = Some(e);
                }
            }
        }

        if let Some(e) = last_error {
            report_error(&format!("{} log record(s) not written", failed), &e);
        }
    }

    fn flush_log_files(&mut self) {
        let today = self.clock.now().date();
        let new_day = today != self.day;
        if new_day {
            self.day = today;
            self.index = [0; LEVELS];
        }

        for file in &mut self.files {
            if !file.is_open() {
                continue;
            }
            if let Err(e) = file.flush() {
                report_error("flush log file", &e);
                let _ = file.close();
                continue;
            }
            if new_day || file.size() >= self.max_file_size || !file.exists() {
                let _ = file.close();
            }
        }
    }
}

/// The severity logger: INFO, WARNING, ERROR and FATAL files.
#[derive(Debug)]
pub struct LevelLogger {
    engine: Logger<LevelWriter>,
}

impl LevelLogger {
    pub fn new(options: &LogOptions) -> Result<Self, LogError> {
        let engine = Logger::new("level-log", options.level_interval, LevelWriter::new(options))
            .map_err(LogError::Spawn)?;
        Ok(Self { engine })
    }

    /// Queue a record. FATAL records must go through [`write_fatal`](Self::write_fatal).
    pub fn push(&self, record: LevelRecord) {
        self.engine.push(record);
    }

    pub fn stop(&self) {
        self.engine.stop();
    }

    pub fn pending(&self) -> usize {
        self.engine.pending()
    }

    pub fn write_fatal(&self, record: &LevelRecord) -> Option<RawFd> {
        self.engine.with_writer(|w| w.write_fatal(record))
    }

    pub(crate) fn write_fatal_note(&self, note: &str) {
        self.engine.with_writer(|w| w.write_fatal_note(note))
    }

    pub(crate) fn fatal_fd(&self) -> Option<RawFd> {
        self.engine.with_writer(|w| w.fatal_fd())
    }
}
