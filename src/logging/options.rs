// SPDX-License-Identifier: Apache-2.0 OR MIT
// Logging flags and the options snapshot built from them

use super::clock::{Clock, SystemClock};
use super::file::LogPaths;
use crate::define_flag;
use crate::flags::{FlagError, FlagRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

define_flag!(pub LOG_DIR: String = "/tmp".to_string(), "log_dir", "log dir, default: /tmp");
define_flag!(pub LOG_PREFIX: String = String::new(), "log_prefix", "prefix of log file name");
define_flag!(pub LOG2STDERR: bool = false, "log2stderr", "log to stderr only");
define_flag!(pub ALSOLOG2STDERR: bool = false, "alsolog2stderr", "log to stderr and file");
define_flag!(pub DLOG_ON: bool = false, "dlog_on", "if true, turn on DLOG");
define_flag!(pub KLOG_OFF: bool = false, "klog_off", "if true, turn off telemetry logs");
define_flag!(
    pub MAX_LOG_FILE_SIZE: u64 = DEFAULT_MAX_FILE_SIZE,
    "max_log_file_size",
    "max size of log file, default: 1G"
);
define_flag!(pub IP: String = String::new(), "ip", "local ip, prepended to telemetry records");

pub const DEFAULT_MAX_FILE_SIZE: u64 = 1 << 30;
pub const DEFAULT_LEVEL_INTERVAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_TAGGED_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_TELEMETRY_INTERVAL: Duration = Duration::from_millis(500);

/// Register the logging flags.
pub fn register_flags(registry: &FlagRegistry) -> Result<(), FlagError> {
    registry.register(&*LOG_DIR)?;
    registry.register(&*LOG_PREFIX)?;
    registry.register(&*LOG2STDERR)?;
    registry.register(&*ALSOLOG2STDERR)?;
    registry.register(&*DLOG_ON)?;
    registry.register(&*KLOG_OFF)?;
    registry.register(&*MAX_LOG_FILE_SIZE)?;
    registry.register(&*IP)?;
    Ok(())
}

/// Where severity records go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Destination {
    #[default]
    File,
    Stderr,
    Both,
}

impl Destination {
    pub fn from_switches(log2stderr: bool, alsolog2stderr: bool) -> Self {
        if alsolog2stderr {
            Destination::Both
        } else if log2stderr {
            Destination::Stderr
        } else {
            Destination::File
        }
    }

    pub fn to_file(self) -> bool {
        self != Destination::Stderr
    }

    pub fn to_stderr(self) -> bool {
        self != Destination::File
    }
}

/// Everything the loggers need, captured once at construction.
#[derive(Debug, Clone)]
pub struct LogOptions {
    pub dir: PathBuf,
    pub prefix: String,
    pub program: String,
    pub max_file_size: u64,
    pub destination: Destination,
    pub dlog_on: bool,
    pub klog_off: bool,
    pub ip: String,
    pub level_interval: Duration,
    pub tagged_interval: Duration,
    pub telemetry_interval: Duration,
    pub clock: Arc<dyn Clock>,
}

impl LogOptions {
    /// Defaults for logging into `dir` under the name `program`.
    pub fn new(dir: impl Into<PathBuf>, program: &str) -> Self {
        Self {
            dir: dir.into(),
            prefix: String::new(),
            program: program.to_string(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            destination: Destination::File,
            dlog_on: false,
            klog_off: false,
            ip: String::new(),
            level_interval: DEFAULT_LEVEL_INTERVAL,
            tagged_interval: DEFAULT_TAGGED_INTERVAL,
            telemetry_interval: DEFAULT_TELEMETRY_INTERVAL,
            clock: Arc::new(SystemClock),
        }
    }

    /// Snapshot of the current flag values.
    pub fn from_flags(program: &str) -> Self {
        Self {
            prefix: LOG_PREFIX.get(),
            max_file_size: MAX_LOG_FILE_SIZE.get(),
            destination: Destination::from_switches(LOG2STDERR.get(), ALSOLOG2STDERR.get()),
            dlog_on: DLOG_ON.get(),
            klog_off: KLOG_OFF.get(),
            ip: IP.get(),
            ..Self::new(LOG_DIR.get(), program)
        }
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_dlog(mut self, on: bool) -> Self {
        self.dlog_on = on;
        self
    }

    pub fn with_klog_off(mut self, off: bool) -> Self {
        self.klog_off = off;
        self
    }

    pub fn with_ip(mut self, ip: &str) -> Self {
        self.ip = ip.to_string();
        self
    }

    /// Use the same tick interval for all three loggers.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.level_interval = interval;
        self.tagged_interval = interval;
        self.telemetry_interval = interval;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn paths(&self) -> LogPaths {
        LogPaths::new(&self.dir, &self.prefix, &self.program)
    }
}

/// Base name of `argv0`, falling back to the executable name.
pub fn program_name(argv0: Option<&str>) -> String {
    let from = |p: &std::path::Path| {
        p.file_name()
            .map(|name| name.to_string_lossy().into_owned())
    };
    argv0
        .and_then(|arg| from(std::path::Path::new(arg)))
        .or_else(|| std::env::current_exe().ok().as_deref().and_then(from))
        .unwrap_or_else(|| "unknown".to_string())
}
