// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Drain engine under concurrent producers.

use ccbase::logging::{BatchWriter, EngineState, Logger};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

const PRODUCERS: u32 = 8;
const RECORDS: u32 = 1000;

struct Collect(Arc<Mutex<Vec<(u32, u32)>>>);

impl BatchWriter for Collect {
    type Record = (u32, u32);

    fn write_logs(&mut self, logs: &mut Vec<(u32, u32)>) {
        self.0.lock().append(logs);
    }

    fn flush_log_files(&mut self) {}
}

/// Every record pushed before `stop` is written exactly once, and records
/// from one producer keep their order.
#[test]
fn test_concurrent_producers_at_most_once_in_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let logger = Arc::new(
        Logger::new("it-engine", Duration::from_millis(50), Collect(Arc::clone(&seen))).unwrap(),
    );

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let logger = Arc::clone(&logger);
            std::thread::spawn(move || {
                for seq in 0..RECORDS {
                    logger.push((p, seq));
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    logger.stop();
    assert_eq!(logger.state(), EngineState::Stopped);
    assert_eq!(logger.pending(), 0);

    let seen = seen.lock();
    assert_eq!(seen.len(), (PRODUCERS * RECORDS) as usize);
    let mut next = vec![0u32; PRODUCERS as usize];
    for &(p, seq) in seen.iter() {
        assert_eq!(seq, next[p as usize], "producer {} out of order", p);
        next[p as usize] += 1;
    }
}

#[test]
fn test_notify_forces_early_tick() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let logger = Logger::new("it-notify", Duration::from_secs(3600), Collect(Arc::clone(&seen))).unwrap();

    logger.push((0, 0));
    logger.notify();
    assert!(super::common::wait_until(|| !seen.lock().is_empty()));
    assert_eq!(logger.state(), EngineState::Running);
}
