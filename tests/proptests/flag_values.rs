// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Property-Based Tests: flag value parsing
//!
//! Decimal, hex and unit-suffixed integers must parse to the value they
//! denote, and anything outside the target type must be rejected rather
//! than wrapped.

#[cfg(test)]
mod tests {
    use ccbase::flags::{FlagValue, ValueError};
    use proptest::prelude::*;

    const UNITS: [(char, u32); 5] = [('k', 10), ('m', 20), ('g', 30), ('t', 40), ('p', 50)];

    proptest! {
        #[test]
        fn test_decimal_and_hex_round_trip(v in any::<i64>(), u in any::<u64>()) {
            prop_assert_eq!(i64::parse_flag(&v.to_string()), Ok(v));
            prop_assert_eq!(u64::parse_flag(&format!("{:#x}", u)), Ok(u));
        }

        /// **Property:** `<n><unit>` is `n << shift`, for either case of
        /// the unit letter.
        #[test]
        fn test_unit_suffix_is_power_of_1024(n in 1u64..1024, unit in 0usize..5, upper in any::<bool>()) {
            let (letter, shift) = UNITS[unit];
            let letter = if upper { letter.to_ascii_uppercase() } else { letter };
            prop_assert_eq!(u64::parse_flag(&format!("{}{}", n, letter)), Ok(n << shift));
        }

        /// **Property:** values that do not fit are range errors.
        #[test]
        fn test_narrowing_is_rejected(v in (i64::from(i32::MAX) + 1)..i64::MAX) {
            let rejected = matches!(i32::parse_flag(&v.to_string()), Err(ValueError::Range { .. }));
            prop_assert!(rejected);
            let negative = matches!(u32::parse_flag(&(-v).to_string()), Err(ValueError::Range { .. }));
            prop_assert!(negative);
        }

        /// **Property:** parsing arbitrary text never panics.
        #[test]
        fn test_arbitrary_text_does_not_panic(text in ".{0,24}") {
            let _ = i32::parse_flag(&text);
            let _ = u64::parse_flag(&text);
            let _ = f64::parse_flag(&text);
            let _ = bool::parse_flag(&text);
        }
    }
}
