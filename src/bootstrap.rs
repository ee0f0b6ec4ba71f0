// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Process startup in one place.
//!
//! [`Bootstrap::run`] performs, in order:
//! 1. register the `config` flag, the logging flags and the caller's flags
//! 2. parse argv
//! 3. parse the config file named by `--config` and start its hot-reload thread
//! 4. build the [`Logging`] context from the flag values (creating the log dir)
//! 5. install the crash handler (optional)
//! 6. install the termination signal handlers (optional)
//! 7. install the context globally for the logging macros
//!
//! [`Context::shutdown`] (or dropping the context) undoes it.

use crate::flags::{AnyFlag, FlagError, FlagRegistry};
use crate::logging::engine::report_error;
use crate::logging::{self, LogError, LogOptions, Logging};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Flags(#[from] FlagError),
    #[error(transparent)]
    Logging(#[from] LogError),
}

/// Startup options.
pub struct Bootstrap {
    flags: Vec<&'static dyn AnyFlag>,
    failure_handler: bool,
    signal_handlers: bool,
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self::new()
    }
}

impl Bootstrap {
    pub fn new() -> Self {
        Self {
            flags: Vec::new(),
            failure_handler: true,
            signal_handlers: true,
        }
    }

    /// Register an application flag.
    pub fn flag(mut self, flag: &'static dyn AnyFlag) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn failure_handler(mut self, install: bool) -> Self {
        self.failure_handler = install;
        self
    }

    pub fn signal_handlers(mut self, install: bool) -> Self {
        self.signal_handlers = install;
        self
    }

    /// Run the startup sequence. `args` is the full argv, program name first.
    pub fn run<I, S>(self, args: I) -> Result<Context, BootstrapError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
        let program = logging::program_name(args.first().map(String::as_str));

        let mut registry = FlagRegistry::new()?;
        logging::register_flags(&registry)?;
        for flag in self.flags {
            registry.register(flag)?;
        }
        let positional = registry.init(args.iter().skip(1))?;

        let logging = Logging::new(LogOptions::from_flags(&program))?;
        if self.failure_handler {
            logging.install_failure_handler()?;
        }
        if self.signal_handlers {
            logging.install_signal_handlers()?;
        }
        logging::install(Arc::clone(&logging));

        Ok(Context {
            registry,
            logging,
            positional,
            program,
        })
    }
}

/// A running process setup: flags, logging, hooks.
#[derive(Debug)]
pub struct Context {
    registry: FlagRegistry,
    logging: Arc<Logging>,
    positional: Vec<String>,
    program: String,
}

impl Context {
    pub fn logging(&self) -> &Arc<Logging> {
        &self.logging
    }

    pub fn registry(&self) -> &FlagRegistry {
        &self.registry
    }

    /// Non-flag arguments, in order.
    pub fn args(&self) -> &[String] {
        &self.positional
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Stop the config watcher, remove the termination signal handlers,
    /// uninstall the global context and drain the loggers.
    pub fn shutdown(self) {}
}

impl Drop for Context {
    fn drop(&mut self) {
        self.registry.stop_watching();
        if let Err(e) = self.logging.uninstall_signal_handlers() {
            report_error("remove signal handlers", &e);
        }
        if logging::global().is_some_and(|g| Arc::ptr_eq(&g, &self.logging)) {
            logging::uninstall();
        }
        self.logging.close();
    }
}
