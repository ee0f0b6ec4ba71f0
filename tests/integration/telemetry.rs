// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Telemetry logger: callback delivery and switch-off.

use super::common::{at, options, wait_until};
use ccbase::log_telemetry;
use ccbase::logging::Logging;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type Seen = Arc<Mutex<Vec<(String, String)>>>;

fn collect(logging: &Logging) -> Seen {
    let seen = Seen::default();
    let sink = Arc::clone(&seen);
    logging.set_telemetry_log_callback(move |topic, line| {
        sink.lock()
            .push((topic.to_string(), String::from_utf8_lossy(line).into_owned()));
    });
    seen
}

fn fs_entries(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[test]
fn test_records_reach_callback() {
    let dir = tempfile::tempdir().unwrap();
    let (options, _clock) = options(dir.path(), at(2024, 5, 1, 8, 0, 0));
    let logging = Logging::new(options.with_ip("10.0.0.1")).unwrap();
    let seen = collect(&logging);

    log_telemetry!(&logging => "click"; "u1", 42, 0.5);
    logging.close();

    assert_eq!(
        *seen.lock(),
        [("click".to_string(), "10.0.0.1&2024-05-01 08:00:00&u1&42&0.5&\n".to_string())]
    );
    assert_eq!(fs_entries(dir.path()), 0);
}

#[test]
fn test_records_without_callback_are_counted() {
    let dir = tempfile::tempdir().unwrap();
    let (options, _clock) = options(dir.path(), at(2024, 5, 1, 8, 0, 0));
    let logging = Logging::new(options).unwrap();

    log_telemetry!(&logging => "early"; 1);
    log_telemetry!(&logging => "early"; 2);
    logging.close();
    assert_eq!(logging.telemetry().dropped(), 2);
}

#[test]
fn test_klog_off_skips_records() {
    let dir = tempfile::tempdir().unwrap();
    let (options, _clock) = options(dir.path(), at(2024, 5, 1, 8, 0, 0));
    let logging = Logging::new(options.with_klog_off(true)).unwrap();
    let seen = collect(&logging);

    log_telemetry!(&logging => "muted"; 1);
    logging.close();
    assert!(seen.lock().is_empty());
    assert_eq!(logging.telemetry().dropped(), 0);
}

#[test]
fn test_flush_per_tick_and_failure_on_close() {
    let dir = tempfile::tempdir().unwrap();
    let (options, _clock) = options(dir.path(), at(2024, 5, 1, 8, 0, 0));
    let logging = Logging::new(options).unwrap();

    let flushes = Arc::new(AtomicUsize::new(0));
    let failures = Arc::new(AtomicUsize::new(0));
    let (f, g) = (Arc::clone(&flushes), Arc::clone(&failures));
    logging.set_telemetry_flush_callback(move || {
        f.fetch_add(1, Ordering::SeqCst);
    });
    logging.set_telemetry_failure_callback(move || {
        g.fetch_add(1, Ordering::SeqCst);
    });

    assert!(wait_until(|| flushes.load(Ordering::SeqCst) >= 3));
    assert_eq!(failures.load(Ordering::SeqCst), 0);
    logging.close();
    assert_eq!(failures.load(Ordering::SeqCst), 1);
}
