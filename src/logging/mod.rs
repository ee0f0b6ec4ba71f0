// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Buffered multi-channel logging.
//!
//! Three loggers share one drain engine ([`engine::Logger`]):
//! - severity logs, one file per level with cascading writes
//!   (`log_info!`, `log_warning!`, `log_error!`, `log_fatal!`, `check!`...)
//! - tagged logs, one file per tag rolled over by day or hour
//!   (`log_tagged!`, `log_debug!`)
//! - telemetry records passed to application callbacks (`log_telemetry!`)
//!
//! Producers only take a short lock to queue a record. Each logger's thread
//! writes its batch once per interval, and [`Logging::close`] drains
//! whatever is left.

mod clock;
mod context;
pub mod engine;
mod failure;
mod file;
mod level;
mod leveled;
#[macro_use]
mod macros;
mod options;
mod record;
mod saver;
mod tagged;
mod telemetry;

pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{global, install, uninstall, Logging, TERMINATED_NOTE, TERMINATION_SIGNALS};
pub use engine::{BatchWriter, EngineState, Logger};
pub use failure::{FailureHandler, FAULT_SIGNALS};
pub use file::{update_symlink, LogFile, LogPaths};
pub use level::Level;
pub use leveled::{LevelLogger, LevelRecord};
pub use options::{
    program_name, register_flags, Destination, LogOptions, ALSOLOG2STDERR, DLOG_ON, IP, KLOG_OFF,
    LOG2STDERR, LOG_DIR, LOG_PREFIX, MAX_LOG_FILE_SIZE,
};
pub use record::{current_thread_id, Appendable, LogRecord};
pub use saver::{LevelLogSaver, LogTarget, StderrLogSaver, TaggedLogSaver, TelemetryLogSaver};
pub use tagged::{Rollover, TaggedLogger, TaggedRecord, DEBUG_TAG_PREFIX, HOURLY_TAG_PREFIX};
pub use telemetry::{HookCallback, LogCallback, TelemetryLogger, TelemetryRecord};

use crate::signal::SignalError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to start logger thread: {0}")]
    Spawn(#[source] io::Error),
    #[error(transparent)]
    Signal(#[from] SignalError),
}
