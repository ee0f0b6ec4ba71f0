// SPDX-License-Identifier: Apache-2.0 OR MIT
//! The logging context: the three loggers, their options, and the process
//! hooks (signals, crash handler, FATAL exit) built around them.

use super::engine::report_error;
use super::failure::{self, FailureHandler};
use super::level::Level;
use super::leveled::{LevelLogger, LevelRecord};
use super::options::LogOptions;
use super::tagged::{TaggedLogger, TaggedRecord};
use super::telemetry::{TelemetryLogger, TelemetryRecord};
use super::LogError;
use crate::signal;
use crate::thread::{Mutex, RwLock};
use nix::sys::signal::Signal;
use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Written to stderr and the FATAL file on SIGTERM.
pub const TERMINATED_NOTE: &str = "terminated: probably killed by someone!\n";

/// Signals that close the loggers before the process goes down.
pub const TERMINATION_SIGNALS: [Signal; 3] = [Signal::SIGTERM, Signal::SIGQUIT, Signal::SIGINT];

static GLOBAL: RwLock<Option<Arc<Logging>>> = parking_lot::const_rwlock(None);

/// Make `logging` the context used by the logging macros. Returns the
/// previously installed one.
pub fn install(logging: Arc<Logging>) -> Option<Arc<Logging>> {
    GLOBAL.write().replace(logging)
}

pub fn uninstall() -> Option<Arc<Logging>> {
    GLOBAL.write().take()
}

pub fn global() -> Option<Arc<Logging>> {
    GLOBAL.read().clone()
}

/// Owner of the severity, tagged and telemetry loggers.
pub struct Logging {
    options: LogOptions,
    level: LevelLogger,
    tagged: TaggedLogger,
    telemetry: TelemetryLogger,
    failure: Mutex<Option<FailureHandler>>,
    signals: AtomicBool,
}

impl Logging {
    /// Start the three loggers. A log directory that cannot be created is
    /// reported, not fatal: writes fail later and are reported per tick.
    pub fn new(options: LogOptions) -> Result<Arc<Self>, LogError> {
        if let Err(e) = std::fs::create_dir_all(&options.dir) {
            report_error(&format!("create log dir {}", options.dir.display()), &e);
        }

        Ok(Arc::new(Self {
            level: LevelLogger::new(&options)?,
            tagged: TaggedLogger::new(&options)?,
            telemetry: TelemetryLogger::new(&options)?,
            options,
            failure: Mutex::new(None),
            signals: AtomicBool::new(false),
        }))
    }

    pub fn options(&self) -> &LogOptions {
        &self.options
    }

    pub fn level(&self) -> &LevelLogger {
        &self.level
    }

    pub fn tagged(&self) -> &TaggedLogger {
        &self.tagged
    }

    pub fn telemetry(&self) -> &TelemetryLogger {
        &self.telemetry
    }

    pub fn dlog_on(&self) -> bool {
        self.options.dlog_on
    }

    /// Queue a severity record. FATAL records take the FATAL path.
    pub fn push_level(&self, record: LevelRecord) {
        if record.level() == Level::Fatal {
            self.fatal(record);
        }
        self.level.push(record);
    }

    pub fn push_tagged(&self, record: TaggedRecord) {
        self.tagged.push(record);
    }

    /// Queue a telemetry record, unless telemetry is switched off.
    pub fn push_telemetry(&self, record: TelemetryRecord) {
        if !self.options.klog_off {
            self.telemetry.push(record);
        }
    }

    /// Stop and drain the tagged, severity and telemetry loggers, in that
    /// order. Safe to call repeatedly.
    pub fn close(&self) {
        self.tagged.stop();
        self.level.stop();
        self.telemetry.stop();
    }

    /// Close everything, write `record` synchronously to the FATAL file and
    /// stderr, then end the process: abort (so the crash handler reports
    /// into the FATAL file) when a crash handler is installed, exit 0
    /// otherwise.
    pub fn fatal(&self, record: LevelRecord) -> ! {
        self.close();
        let fd = self.level.write_fatal(&record);

        if let Some(handler) = self.failure.lock().as_ref() {
            handler.clear_callback();
            handler.set_fd(fd);
            std::process::abort();
        }
        std::process::exit(0)
    }

    /// Route fault signals through the crash handler, closing the loggers
    /// first and reporting into the FATAL file.
    pub fn install_failure_handler(self: &Arc<Self>) -> Result<(), LogError> {
        let handler = FailureHandler::install()?;
        let weak = Arc::downgrade(self);
        handler.set_callback(move || {
            if let Some(logging) = weak.upgrade() {
                logging.close();
                failure::set_report_fd(logging.level.fatal_fd());
            }
        });
        *self.failure.lock() = Some(handler);
        Ok(())
    }

    pub fn has_failure_handler(&self) -> bool {
        self.failure.lock().is_some()
    }

    /// Close the loggers on SIGTERM, SIGQUIT and SIGINT; ignore SIGPIPE.
    pub fn install_signal_handlers(self: &Arc<Self>) -> Result<(), LogError> {
        if self.signals.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        for sig in TERMINATION_SIGNALS {
            let weak = Arc::downgrade(self);
            signal::add_handler(sig, move || {
                if let Some(logging) = weak.upgrade() {
                    logging.on_terminate(sig);
                }
            })?;
        }
        signal::ignore(Signal::SIGPIPE)?;
        Ok(())
    }

    /// Remove the termination chains installed by
    /// [`install_signal_handlers`](Self::install_signal_handlers). A no-op
    /// when this context did not install them.
    pub fn uninstall_signal_handlers(&self) -> Result<(), LogError> {
        if !self.signals.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        for sig in TERMINATION_SIGNALS {
            signal::del_handler(sig)?;
        }
        Ok(())
    }

    pub fn has_signal_handlers(&self) -> bool {
        self.signals.load(Ordering::Acquire)
    }

    fn on_terminate(&self, sig: Signal) {
        self.close();
        if sig == Signal::SIGTERM {
            let _ = std::io::stderr().write_all(TERMINATED_NOTE.as_bytes());
            self.level.write_fatal_note(TERMINATED_NOTE);
        }
    }

    pub fn log_by_day(&self, tag: &str) {
        self.tagged.log_by_day(tag);
    }

    pub fn log_by_hour(&self, tag: &str) {
        self.tagged.log_by_hour(tag);
    }

    pub fn set_telemetry_log_callback<F>(&self, callback: F)
    where
        F: Fn(&str, &[u8]) + Send + Sync + 'static,
    {
        self.telemetry.set_log_callback(callback);
    }

    pub fn set_telemetry_flush_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.telemetry.set_flush_callback(callback);
    }

    pub fn set_telemetry_failure_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.telemetry.set_failure_callback(callback);
    }
}

impl fmt::Debug for Logging {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logging")
            .field("options", &self.options)
            .field("level", &self.level)
            .field("tagged", &self.tagged)
            .field("telemetry", &self.telemetry)
            .finish_non_exhaustive()
    }
}
