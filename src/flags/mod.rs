// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Typed command line flags, backed by statics.
//!
//! Flags are declared with [`define_flag!`](crate::define_flag) and registered
//! into a [`FlagRegistry`], which fills them from argv, from a config file,
//! and (for `!name = value` config lines) from a background hot-reload thread.
//!
//! ```ignore
//! define_flag!(pub WORKERS: u32 = 4, "workers", "number of worker threads");
//!
//! let registry = FlagRegistry::new()?;
//! registry.register(&*WORKERS)?;
//! let positional = registry.init(std::env::args().skip(1))?;
//! let n = WORKERS.get();
//! ```

mod config;
mod value;

pub use value::{parse_integer, FlagKind, FlagValue, ValueError};

use crate::thread::{RwLock, RwLockReadGuard, StoppableThread};
use config::{logical_lines, parse_line, ConfigWatch};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// How often the hot-reload thread polls the config file.
pub const DEFAULT_RELOAD_PERIOD: Duration = Duration::from_millis(3000);

/// Declare a flag as a lazily initialized static.
///
/// `define_flag!(pub NAME: type = default, "name", "help");`
/// Flags with an empty help string are left out of the help text.
#[macro_export]
macro_rules! define_flag {
    ($(#[$meta:meta])* $vis:vis $ident:ident : $ty:ty = $default:expr, $name:literal, $help:literal $(,)?) => {
        $(#[$meta])*
        $vis static $ident: ::std::sync::LazyLock<$crate::flags::Flag<$ty>> =
            ::std::sync::LazyLock::new(|| {
                $crate::flags::Flag::new($name, $default, $help, file!())
            });
    };
}

define_flag!(pub CONFIG: String = String::new(), "config", "path of config file");

#[derive(Debug, Error)]
pub enum FlagError {
    #[error("flags defined with the same name: {name}, from {first} and {second}")]
    Duplicate {
        name: &'static str,
        first: &'static str,
        second: &'static str,
    },
    #[error("flag not defined: {0}")]
    Unknown(String),
    #[error("value not set for non-bool flag: {0}")]
    NotBool(String),
    #[error("invalid combination of bool flags: {0}")]
    BadBundle(String),
    #[error("invalid parameter: {0}")]
    InvalidArgument(String),
    #[error("{source} (flag {name})")]
    Value {
        name: String,
        #[source]
        source: ValueError,
    },
    #[error("invalid config: {text}, at {}:{line}", .path.display())]
    InvalidConfig {
        path: PathBuf,
        line: usize,
        text: String,
    },
    #[error("{source}, at {}:{line}", .path.display())]
    Config {
        path: PathBuf,
        line: usize,
        #[source]
        source: Box<FlagError>,
    },
    #[error("failed to open config file: {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to start config watcher: {0}")]
    Watcher(#[source] io::Error),
    /// `--help` (or a lone run of dashes) was given. Carries the help text.
    #[error("{0}")]
    HelpRequested(String),
}

/// A typed flag value with its registration metadata.
pub struct Flag<T: FlagValue> {
    name: &'static str,
    help: &'static str,
    file: &'static str,
    default: T,
    value: RwLock<T>,
}

impl<T: FlagValue> Flag<T> {
    pub fn new(name: &'static str, default: T, help: &'static str, file: &'static str) -> Self {
        Self {
            name,
            help,
            file,
            value: RwLock::new(default.clone()),
            default,
        }
    }

    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.value.read()
    }

    pub fn set(&self, value: T) {
        *self.value.write() = value;
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    pub fn reset(&self) {
        self.set(self.default.clone());
    }
}

impl<T: FlagValue> fmt::Debug for Flag<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("name", &self.name)
            .field("kind", &T::KIND)
            .field("value", &self.value.read().to_string())
            .finish()
    }
}

/// Type-erased view of a [`Flag`], as stored in the registry.
pub trait AnyFlag: Send + Sync {
    fn name(&self) -> &'static str;
    fn kind(&self) -> FlagKind;
    fn help(&self) -> &'static str;
    fn file(&self) -> &'static str;
    fn default_text(&self) -> String;
    fn value_text(&self) -> String;
    fn set_text(&self, text: &str) -> Result<(), ValueError>;
}

impl<T: FlagValue> AnyFlag for Flag<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> FlagKind {
        T::KIND
    }

    fn help(&self) -> &'static str {
        self.help
    }

    fn file(&self) -> &'static str {
        self.file
    }

    fn default_text(&self) -> String {
        self.default.to_string()
    }

    fn value_text(&self) -> String {
        self.value.read().to_string()
    }

    fn set_text(&self, text: &str) -> Result<(), ValueError> {
        self.set(T::parse_flag(text)?);
        Ok(())
    }
}

/// Registration metadata of one flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagInfo {
    pub name: &'static str,
    pub kind: FlagKind,
    pub default: String,
    pub help: &'static str,
    pub file: &'static str,
}

impl FlagInfo {
    fn of(flag: &dyn AnyFlag) -> Self {
        Self {
            name: flag.name(),
            kind: flag.kind(),
            default: flag.default_text(),
            help: flag.help(),
            file: flag.file(),
        }
    }
}

impl fmt::Display for FlagInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "--{}: {}\n\t type: {}\t     default: {}\n\t from: {}",
            self.name, self.help, self.kind, self.default, self.file
        )
    }
}

type FlagMap = BTreeMap<&'static str, &'static dyn AnyFlag>;

/// Name to flag table plus the optional config hot-reload thread.
pub struct FlagRegistry {
    flags: Arc<RwLock<FlagMap>>,
    watcher: Option<StoppableThread>,
}

impl FlagRegistry {
    /// A registry holding only the `config` flag.
    pub fn new() -> Result<Self, FlagError> {
        let registry = Self {
            flags: Arc::new(RwLock::new(BTreeMap::new())),
            watcher: None,
        };
        registry.register(&*CONFIG)?;
        Ok(registry)
    }

    pub fn register(&self, flag: &'static dyn AnyFlag) -> Result<(), FlagError> {
        let mut flags = self.flags.write();
        if let Some(existing) = flags.get(flag.name()) {
            return Err(FlagError::Duplicate {
                name: flag.name(),
                first: existing.file(),
                second: flag.file(),
            });
        }
        flags.insert(flag.name(), flag);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.flags.read().contains_key(name)
    }

    pub fn info(&self, name: &str) -> Option<FlagInfo> {
        self.flags.read().get(name).map(|flag| FlagInfo::of(*flag))
    }

    /// Current value of `name`, rendered as text.
    pub fn value_text(&self, name: &str) -> Option<String> {
        self.flags.read().get(name).map(|flag| flag.value_text())
    }

    pub fn set_flag_value(&self, name: &str, value: &str) -> Result<(), FlagError> {
        set_flag_value(&self.flags.read(), name, value)
    }

    /// One entry per flag with a non-empty help string, ordered by name.
    pub fn help_text(&self) -> String {
        let mut text = String::new();
        for flag in self.flags.read().values() {
            if !flag.help().is_empty() {
                text.push_str(&FlagInfo::of(*flag).to_string());
                text.push('\n');
            }
        }
        text
    }

    /// Apply `--name=value`, `--name` and bundled `-abc` arguments.
    ///
    /// `args` excludes the program name. Arguments not starting with `-` are
    /// returned in order.
    pub fn parse_args<I, S>(&self, args: I) -> Result<Vec<String>, FlagError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();

        if let [only] = args.as_slice() {
            if only == "--help" || only.chars().all(|c| c == '-') {
                return Err(FlagError::HelpRequested(self.help_text()));
            }
        }

        let flags = self.flags.read();
        let mut positional = Vec::new();
        for arg in args {
            if !arg.starts_with('-') {
                positional.push(arg);
                continue;
            }

            let Some(bp) = arg.find(|c: char| c != '-') else {
                return Err(FlagError::InvalidArgument(arg));
            };
            match arg.find('=') {
                Some(ep) if ep <= bp => return Err(FlagError::InvalidArgument(arg)),
                Some(ep) => set_flag_value(&flags, &arg[bp..ep], &arg[ep + 1..])?,
                None => set_bool_flags(&flags, &arg[bp..])?,
            }
        }
        Ok(positional)
    }

    /// Apply every assignment in the config file at `path`.
    pub fn parse_config(&self, path: impl AsRef<Path>) -> Result<(), FlagError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| FlagError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let flags = self.flags.read();
        for line in logical_lines(&content) {
            match parse_line(&line.text) {
                Ok(Some(assign)) => set_flag_value(&flags, &assign.name, &assign.value)
                    .map_err(|e| FlagError::Config {
                        path: path.to_path_buf(),
                        line: line.number,
                        source: Box::new(e),
                    })?,
                Ok(None) => {}
                Err(()) => {
                    return Err(FlagError::InvalidConfig {
                        path: path.to_path_buf(),
                        line: line.number,
                        text: line.text,
                    })
                }
            }
        }
        Ok(())
    }

    /// Start polling `path` every `period`, re-applying its `!` lines when
    /// the file changes. Replaces a previous watcher.
    pub fn watch_config(&mut self, path: impl Into<PathBuf>, period: Duration) -> Result<(), FlagError> {
        self.stop_watching();

        let flags = Arc::clone(&self.flags);
        let mut watch = ConfigWatch::new(path);
        let thread = StoppableThread::spawn("flag-reload", period, move || {
            reload_hot_lines(&flags, &mut watch)
        })
        .map_err(FlagError::Watcher)?;

        self.watcher = Some(thread);
        Ok(())
    }

    pub fn stop_watching(&mut self) {
        if let Some(thread) = self.watcher.take() {
            thread.join();
        }
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    /// Parse argv, then the file named by `--config` (starting the
    /// hot-reload thread for it). Returns the positional arguments.
    pub fn init<I, S>(&mut self, args: I) -> Result<Vec<String>, FlagError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let positional = self.parse_args(args)?;
        let config = CONFIG.get();
        if !config.is_empty() {
            self.parse_config(&config)?;
            self.watch_config(config, DEFAULT_RELOAD_PERIOD)?;
        }
        Ok(positional)
    }
}

impl fmt::Debug for FlagRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagRegistry")
            .field("flags", &self.flags.read().keys().collect::<Vec<_>>())
            .field("watching", &self.is_watching())
            .finish()
    }
}

fn set_flag_value(flags: &FlagMap, name: &str, value: &str) -> Result<(), FlagError> {
    let flag = flags
        .get(name)
        .ok_or_else(|| FlagError::Unknown(name.to_string()))?;
    flag.set_text(value).map_err(|source| FlagError::Value {
        name: name.to_string(),
        source,
    })
}

/// `--abc` sets bool flag `abc`; failing that, each of `a`, `b`, `c`.
fn set_bool_flags(flags: &FlagMap, name: &str) -> Result<(), FlagError> {
    if let Some(flag) = flags.get(name) {
        if flag.kind() != FlagKind::Bool {
            return Err(FlagError::NotBool(name.to_string()));
        }
        return set_flag_value(flags, name, "true");
    }

    for (i, c) in name.char_indices() {
        let single = &name[i..i + c.len_utf8()];
        match flags.get(single) {
            Some(flag) if flag.kind() == FlagKind::Bool => set_flag_value(flags, single, "true")?,
            _ => return Err(FlagError::BadBundle(name.to_string())),
        }
    }
    Ok(())
}

fn reload_hot_lines(flags: &RwLock<FlagMap>, watch: &mut ConfigWatch) {
    if !watch.changed() {
        return;
    }

    let content = match watch.read() {
        Ok(content) => content,
        Err(e) => {
            crate::log_error!("failed to open config file: {}: {}", watch.path().display(), e);
            return;
        }
    };

    let flags = flags.read();
    for line in logical_lines(&content) {
        if !line.text.starts_with('!') {
            continue;
        }
        let result = match parse_line(&line.text) {
            Ok(Some(assign)) => set_flag_value(&flags, &assign.name, &assign.value),
            Ok(None) => Ok(()),
            Err(()) => Err(FlagError::InvalidConfig {
                path: watch.path().to_path_buf(),
                line: line.number,
                text: line.text.clone(),
            }),
        };
        if let Err(e) = result {
            crate::log_error!("{}, at {}:{}", e, watch.path().display(), line.number);
        }
    }
}
