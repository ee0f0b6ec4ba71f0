// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Tagged logger: per-tag files and rollover disciplines.

use super::common::{at, options, read, settle, wait_until};
use ccbase::logging::{Logging, Rollover};
use ccbase::{log_debug, log_tagged};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_by_day_file_and_line_format() {
    let dir = tempfile::tempdir().unwrap();
    let (options, _clock) = options(dir.path(), at(2024, 5, 1, 10, 30, 0));
    let logging = Logging::new(options).unwrap();

    log_tagged!(&logging => "access", "GET {}", "/index");
    logging.close();

    let text = read(dir.path().join("app_access_20240501.log"));
    assert!(text.starts_with("2024-05-01 10:30:00 tests/integration/tagged.rs:"));
    assert!(text.ends_with("] GET /index\n"));
    assert_eq!(
        fs::read_link(dir.path().join("app.access")).unwrap(),
        PathBuf::from("app_access_20240501.log")
    );
}

#[test]
fn test_klog_tags_roll_hourly() {
    let dir = tempfile::tempdir().unwrap();
    let (options, clock) = options(dir.path(), at(2024, 5, 1, 10, 30, 0));
    let logging = Logging::new(options).unwrap();
    assert_eq!(logging.tagged().rollover("klog_click"), Rollover::ByHour);

    let first = dir.path().join("app_klog_click_2024050110.log");
    log_tagged!(&logging => "klog_click", "one");
    assert!(wait_until(|| read(&first).contains("one")));

    clock.set(at(2024, 5, 1, 11, 30, 0));
    settle();
    log_tagged!(&logging => "klog_click", "two");
    logging.close();

    assert!(!read(&first).contains("two"));
    assert!(read(dir.path().join("app_klog_click_2024050111.log")).contains("two"));
}

#[test]
fn test_explicit_discipline_overrides_default() {
    let dir = tempfile::tempdir().unwrap();
    let (options, clock) = options(dir.path(), at(2024, 5, 1, 10, 30, 0));
    let logging = Logging::new(options).unwrap();
    logging.log_by_hour("orders");
    logging.log_by_day("klog_daily");

    log_tagged!(&logging => "orders", "o");
    log_tagged!(&logging => "klog_daily", "k");
    let orders = dir.path().join("app_orders_2024050110.log");
    let daily = dir.path().join("app_klog_daily_20240501.log");
    assert!(wait_until(|| read(&orders).contains('o') && read(&daily).contains('k')));

    // An hour later only the hourly tag moves to a new file.
    clock.set(at(2024, 5, 1, 11, 30, 0));
    settle();
    log_tagged!(&logging => "klog_daily", "k2");
    logging.close();
    assert!(read(&daily).contains("k2"));
}

#[test]
fn test_debug_tags_follow_switch() {
    let dir = tempfile::tempdir().unwrap();
    let (options, _clock) = options(dir.path(), at(2024, 5, 1, 10, 30, 0));
    let quiet = Logging::new(options.clone()).unwrap();
    let mut evaluated = false;
    log_debug!(&quiet => "cache", "{}", {
        evaluated = true;
        "miss"
    });
    quiet.close();
    assert!(!evaluated);
    assert!(!dir.path().join("app_dlog_cache_20240501.log").exists());

    let loud = Logging::new(options.with_dlog(true)).unwrap();
    log_debug!(&loud => "cache", "miss {}", 7);
    loud.close();
    assert!(read(dir.path().join("app_dlog_cache_20240501.log")).contains("] miss 7"));
}

/// 1000 records from 8 threads, 50 ms tick, then stop: every record is in
/// the tag file once, and each thread's records keep their order.
#[test]
fn test_concurrent_writers_then_stop() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 125;

    let dir = tempfile::tempdir().unwrap();
    let (options, _clock) = options(dir.path(), at(2024, 5, 1, 10, 30, 0));
    let logging = Logging::new(options.with_interval(Duration::from_millis(50))).unwrap();

    let writers: Vec<_> = (0..THREADS)
        .map(|t| {
            let logging = Arc::clone(&logging);
            std::thread::spawn(move || {
                for seq in 0..PER_THREAD {
                    log_tagged!(&logging => "orders", "{} {}", t, seq);
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }
    logging.tagged().stop();

    let text = read(dir.path().join("app.orders"));
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), THREADS * PER_THREAD);

    let mut next = [0usize; THREADS];
    for line in lines {
        let (_, msg) = line.rsplit_once("] ").unwrap();
        let (t, seq) = msg.split_once(' ').unwrap();
        let (t, seq): (usize, usize) = (t.parse().unwrap(), seq.parse().unwrap());
        assert_eq!(seq, next[t], "thread {} out of order", t);
        next[t] += 1;
    }
    assert_eq!(next, [PER_THREAD; THREADS]);
    logging.close();
}
