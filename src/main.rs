// SPDX-License-Identifier: Apache-2.0 OR MIT
//! `ccdemo`: exercises the logging stack end to end.
//!
//! ```text
//! ccdemo [--flags] info      write a few records of every kind, then exit
//! ccdemo [--flags] fatal     log_fatal!
//! ccdemo [--flags] check     a failing check_eq!
//! ccdemo [--flags] sigterm   chain two handlers, then raise SIGTERM
//! ccdemo [--flags] segv      raise SIGSEGV
//! ```

use anyhow::{bail, Context as _, Result};
use ccbase::flags::FlagError;
use ccbase::logging::Level;
use ccbase::signal;
use ccbase::{
    check_eq, define_flag, log_error, log_fatal, log_info, log_tagged, log_telemetry,
    log_warning, Bootstrap, BootstrapError,
};
use nix::sys::signal::Signal;

define_flag!(CRASH_HANDLER: bool = false, "crash_handler", "install the crash handler");
define_flag!(COUNT: u32 = 3, "count", "records written per channel by `info`");

fn main() -> Result<()> {
    let bootstrap = Bootstrap::new()
        .flag(&*CRASH_HANDLER)
        .flag(&*COUNT)
        .failure_handler(false);

    let ctx = match bootstrap.run(std::env::args()) {
        Ok(ctx) => ctx,
        Err(BootstrapError::Flags(FlagError::HelpRequested(help))) => {
            print!("{}", help);
            return Ok(());
        }
        Err(e) => return Err(e).context("startup failed"),
    };
    if CRASH_HANDLER.get() {
        ctx.logging().install_failure_handler()?;
    }

    let command = ctx.args().first().cloned().unwrap_or_else(|| "info".to_string());
    match command.as_str() {
        "info" => {
            ctx.logging()
                .set_telemetry_log_callback(|topic, line| eprint!("{} {}", topic, String::from_utf8_lossy(line)));
            for i in 0..COUNT.get() {
                log_info!("info record {}", i);
                log_warning!("warning record {}", i);
                log_error!("error record {}", i);
                log_tagged!("demo", "tagged record {}", i);
                log_telemetry!("demo"; i, Level::Info.as_str());
            }
            ctx.shutdown();
        }
        "fatal" => log_fatal!("demo fatal {}", 42),
        "check" => check_eq!(1 + 1, 3, "arithmetic is broken"),
        "sigterm" => {
            signal::add_handler(Signal::SIGTERM, || write_stderr(b"handler 1\n"))?;
            signal::add_handler(Signal::SIGTERM, || write_stderr(b"handler 2\n"))?;
            signal::raise(Signal::SIGTERM)?;
            std::thread::sleep(std::time::Duration::from_secs(10));
            bail!("still alive after SIGTERM");
        }
        "segv" => {
            signal::raise(Signal::SIGSEGV)?;
            std::thread::sleep(std::time::Duration::from_secs(10));
            bail!("still alive after SIGSEGV");
        }
        other => bail!("unknown command: {}", other),
    }
    Ok(())
}

fn write_stderr(msg: &[u8]) {
    // SAFETY: write(2) is async-signal-safe
    unsafe {
        libc::write(libc::STDERR_FILENO, msg.as_ptr().cast(), msg.len());
    }
}
