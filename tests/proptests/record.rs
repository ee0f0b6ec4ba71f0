// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Property-Based Tests: LogRecord
//!
//! Arbitrary append sequences must behave like appending to a `Vec<u8>`,
//! with capacity never below size and never shrinking.

#[cfg(test)]
mod tests {
    use ccbase::logging::{Level, LogRecord};
    use proptest::prelude::*;

    proptest! {
        /// **Property:** content equals the concatenation of the appended
        /// chunks; capacity covers the size and only grows.
        #[test]
        fn test_append_matches_concatenation(
            initial in 0usize..64,
            chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..300), 0..20),
        ) {
            let mut record = LogRecord::with_capacity(initial);
            let mut expected = Vec::new();
            let mut capacity = record.capacity();
            for chunk in &chunks {
                record.append(chunk);
                expected.extend_from_slice(chunk);
                prop_assert!(record.capacity() >= record.size());
                prop_assert!(record.capacity() >= capacity);
                capacity = record.capacity();
            }
            prop_assert_eq!(record.data(), expected.as_slice());
        }

        /// **Property:** integers render exactly like `Display`.
        #[test]
        fn test_integers_render_in_decimal(a in any::<i64>(), b in any::<u32>()) {
            let mut record = LogRecord::new();
            record.put(a).put(' ').put(b);
            prop_assert_eq!(record.to_string_lossy(), format!("{} {}", a, b));
        }

        /// **Property:** `%.7g` output parses back to the value rounded to
        /// seven significant digits.
        #[test]
        fn test_float_keeps_seven_digits(v in -1.0e12f64..1.0e12f64) {
            let mut record = LogRecord::new();
            record.put(v);
            let text = record.to_string_lossy().into_owned();
            let parsed: f64 = text.parse().unwrap();
            let rounded: f64 = format!("{:.6e}", v).parse().unwrap();
            prop_assert_eq!(parsed, rounded, "rendered {:?}", text);
            prop_assert!(!text.contains('.') || !text.split('e').next().unwrap().ends_with('0'));
        }

        /// **Property:** a record at level L reaches the files of INFO..=L,
        /// and FATAL only reaches its own file.
        #[test]
        fn test_cascade_targets(level in 0u8..4) {
            let level = Level::from_u8(level).unwrap();
            let targets: Vec<Level> = level.cascade().collect();
            if level == Level::Fatal {
                prop_assert_eq!(targets, vec![Level::Fatal]);
            } else {
                prop_assert_eq!(targets.last(), Some(&level));
                prop_assert_eq!(targets.len(), level.index() + 1);
            }
        }
    }
}
