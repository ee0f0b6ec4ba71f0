// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Severity logger: cascading files, naming and rotation.

use super::common::{at, options, read, settle, wait_until};
use ccbase::logging::{Destination, Logging};
use ccbase::{log_error, log_info, log_warning};
use std::fs;
use std::path::PathBuf;

fn lines(text: &str) -> Vec<&str> {
    text.lines().collect()
}

#[test]
fn test_cascade_into_lower_level_files() {
    let dir = tempfile::tempdir().unwrap();
    let (options, _clock) = options(dir.path(), at(2024, 5, 1, 10, 0, 0));
    let logging = Logging::new(options).unwrap();

    log_info!(&logging => "info {}", 1);
    log_warning!(&logging => "warning {}", 2);
    log_error!(&logging => "error {}", 3);
    logging.close();

    let info = read(dir.path().join("app.20240501.INFO"));
    let warning = read(dir.path().join("app.20240501.WARNING"));
    let error = read(dir.path().join("app.20240501.ERROR"));

    let info = lines(&info);
    assert_eq!(info.len(), 3);
    assert!(info[0].starts_with("I0501 10:00:00 "));
    assert!(info[0].ends_with("] info 1"));
    assert!(info[1].starts_with("W0501 10:00:00 "));
    assert!(info[2].starts_with("E0501 10:00:00 "));
    assert_eq!(lines(&warning).len(), 2);
    assert_eq!(lines(&error), [info[2]]);
    assert!(!dir.path().join("app.20240501.FATAL").exists());

    assert_eq!(
        fs::read_link(dir.path().join("app.INFO")).unwrap(),
        PathBuf::from("app.20240501.INFO")
    );
}

#[test]
fn test_record_carries_thread_and_location() {
    let dir = tempfile::tempdir().unwrap();
    let (options, _clock) = options(dir.path(), at(2024, 5, 1, 10, 0, 0));
    let logging = Logging::new(options).unwrap();

    log_info!(&logging => "located");
    logging.close();

    let text = read(dir.path().join("app.INFO"));
    let fields: Vec<&str> = text.trim_end().splitn(5, ' ').collect();
    assert_eq!(fields[0], "I0501");
    assert_eq!(fields[1], "10:00:00");
    assert!(fields[2].parse::<u32>().is_ok(), "thread id in {:?}", text);
    assert!(fields[3].starts_with("tests/integration/severity.rs:"));
    assert_eq!(fields[4], "located");
}

#[test]
fn test_day_change_opens_new_file() {
    let dir = tempfile::tempdir().unwrap();
    let (options, clock) = options(dir.path(), at(2024, 5, 1, 23, 59, 58));
    let logging = Logging::new(options).unwrap();

    let day1 = dir.path().join("app.20240501.INFO");
    log_info!(&logging => "before midnight");
    assert!(wait_until(|| read(&day1).contains("before midnight")));

    clock.set(at(2024, 5, 2, 0, 0, 1));
    settle();
    log_info!(&logging => "after midnight");
    logging.close();

    let day2 = dir.path().join("app.20240502.INFO");
    assert!(!read(&day1).contains("after midnight"));
    assert!(read(&day2).starts_with("I0502 00:00:01 "));
    assert_eq!(
        fs::read_link(dir.path().join("app.INFO")).unwrap(),
        PathBuf::from("app.20240502.INFO")
    );
}

#[test]
fn test_full_file_rotates_to_next_index() {
    let dir = tempfile::tempdir().unwrap();
    let (options, _clock) = options(dir.path(), at(2024, 5, 1, 12, 0, 0));
    let logging = Logging::new(options.with_max_file_size(1)).unwrap();

    let first = dir.path().join("app.20240501.INFO");
    log_info!(&logging => "first");
    assert!(wait_until(|| read(&first).contains("first")));

    log_info!(&logging => "second");
    logging.close();

    let second = dir.path().join("app.20240501_1.INFO");
    assert!(!read(&first).contains("second"));
    assert!(read(&second).contains("second"));
    assert_eq!(
        fs::read_link(dir.path().join("app.INFO")).unwrap(),
        PathBuf::from("app.20240501_1.INFO")
    );
}

#[test]
fn test_removed_file_is_recreated() {
    let dir = tempfile::tempdir().unwrap();
    let (options, _clock) = options(dir.path(), at(2024, 5, 1, 12, 0, 0));
    let logging = Logging::new(options).unwrap();

    let path = dir.path().join("app.20240501.INFO");
    log_info!(&logging => "one");
    assert!(wait_until(|| read(&path).contains("one")));
    fs::remove_file(&path).unwrap();
    settle();

    log_info!(&logging => "two");
    logging.close();
    let text = read(&path);
    assert!(text.contains("two") && !text.contains("one"));
}

#[test]
fn test_prefix_applies_to_files_and_links() {
    let dir = tempfile::tempdir().unwrap();
    let (options, _clock) = options(dir.path(), at(2024, 5, 1, 12, 0, 0));
    let logging = Logging::new(options.with_prefix("svc")).unwrap();

    log_warning!(&logging => "prefixed");
    logging.close();
    assert!(read(dir.path().join("svc.app.20240501.WARNING")).contains("prefixed"));
    assert!(dir.path().join("svc.app.WARNING").exists());
}

#[test]
fn test_stderr_only_creates_no_files() {
    let dir = tempfile::tempdir().unwrap();
    let (options, _clock) = options(dir.path(), at(2024, 5, 1, 12, 0, 0));
    let logging = Logging::new(options.with_destination(Destination::Stderr)).unwrap();

    log_error!(&logging => "stderr only");
    logging.close();
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_missing_log_dir_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let (options, _clock) = options(&nested, at(2024, 5, 1, 12, 0, 0));
    let logging = Logging::new(options).unwrap();

    log_info!(&logging => "nested");
    logging.close();
    assert!(read(nested.join("app.INFO")).contains("nested"));
}
