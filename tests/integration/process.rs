// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Process-level behavior, checked by running the `ccdemo` binary.
//!
//! Skipped under tarpaulin, whose ptrace-based runner interferes with
//! signal delivery and abort.
#![cfg(not(tarpaulin))]

use anyhow::Result;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{Command, Output};

fn ccdemo(log_dir: &Path, args: &[&str]) -> Result<Output> {
    let output = Command::new(env!("CARGO_BIN_EXE_ccdemo"))
        .arg(format!("--log_dir={}", log_dir.display()))
        .args(args)
        .output()?;
    Ok(output)
}

fn fatal_log(dir: &Path) -> String {
    std::fs::read_to_string(dir.join("ccdemo.FATAL")).unwrap_or_default()
}

#[test]
fn test_info_writes_all_channels() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output = ccdemo(dir.path(), &["--count=2", "info"])?;
    assert!(output.status.success());

    let info = std::fs::read_to_string(dir.path().join("ccdemo.INFO"))?;
    assert_eq!(info.lines().count(), 6);
    let error = std::fs::read_to_string(dir.path().join("ccdemo.ERROR"))?;
    assert_eq!(error.lines().count(), 2);
    let tagged = std::fs::read_to_string(dir.path().join("ccdemo.demo"))?;
    assert!(tagged.contains("] tagged record 1"));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("&1&INFO&\n"), "stderr: {}", stderr);
    Ok(())
}

#[test]
fn test_fatal_without_crash_handler_exits_zero() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output = ccdemo(dir.path(), &["fatal"])?;
    assert_eq!(output.status.code(), Some(0));

    let fatal = fatal_log(dir.path());
    assert!(fatal.starts_with('F'));
    assert!(fatal.contains("] fatal error! demo fatal 42\n"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("demo fatal 42"));

    let info = std::fs::read_to_string(dir.path().join("ccdemo.INFO")).unwrap_or_default();
    assert!(!info.contains("demo fatal"));
    Ok(())
}

#[test]
fn test_fatal_with_crash_handler_aborts() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output = ccdemo(dir.path(), &["--crash_handler", "fatal"])?;
    assert_eq!(output.status.signal(), Some(libc::SIGABRT));

    let fatal = fatal_log(dir.path());
    let message = fatal.find("demo fatal 42").unwrap_or(usize::MAX);
    let report = fatal.find("*** SIGABRT received").unwrap_or(0);
    assert!(message < report, "FATAL log: {}", fatal);
    Ok(())
}

#[test]
fn test_failed_check_takes_fatal_path() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output = ccdemo(dir.path(), &["check"])?;
    assert_eq!(output.status.code(), Some(0));
    assert!(fatal_log(dir.path()).contains("check failed: 1 + 1 == 3, 2 vs 3 arithmetic is broken"));
    Ok(())
}

#[test]
fn test_sigterm_runs_chain_and_reraises() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output = ccdemo(dir.path(), &["sigterm"])?;
    assert_eq!(output.status.signal(), Some(libc::SIGTERM));

    let stderr = String::from_utf8_lossy(&output.stderr);
    let second = stderr.find("handler 2").unwrap_or(usize::MAX);
    let first = stderr.find("handler 1").unwrap_or(usize::MAX);
    let note = stderr.find("terminated: probably killed by someone!").unwrap_or(usize::MAX);
    assert!(second < first && first < note, "stderr: {}", stderr);
    assert!(fatal_log(dir.path()).contains("terminated: probably killed by someone!\n"));
    Ok(())
}

#[test]
fn test_segv_report_goes_to_fatal_log() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output = ccdemo(dir.path(), &["--crash_handler", "segv"])?;
    assert_eq!(output.status.signal(), Some(libc::SIGSEGV));
    assert!(fatal_log(dir.path()).contains("*** SIGSEGV received, aborting ***"));
    Ok(())
}

#[test]
fn test_help_and_bad_flags() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let help = Command::new(env!("CARGO_BIN_EXE_ccdemo")).arg("--help").output()?;
    assert!(help.status.success());
    let text = String::from_utf8_lossy(&help.stdout);
    assert!(text.contains("--log_dir: "));
    assert!(text.contains("--crash_handler: install the crash handler"));

    let bad = ccdemo(dir.path(), &["--no_such_flag=1", "info"])?;
    assert!(!bad.status.success());
    assert!(String::from_utf8_lossy(&bad.stderr).contains("flag not defined: no_such_flag"));
    Ok(())
}
