// SPDX-License-Identifier: Apache-2.0 OR MIT
// Text to typed flag value conversion

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("invalid value for bool: {0}")]
    Bool(String),
    #[error("invalid value for integer: {0}")]
    Integer(String),
    #[error("out of range for {kind}: {value}")]
    Range { kind: FlagKind, value: String },
    #[error("invalid value for double: {0}")]
    Double(String),
}

/// Type tag shown in the help text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKind {
    String,
    Bool,
    I32,
    U32,
    I64,
    U64,
    F64,
}

impl FlagKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FlagKind::String => "string",
            FlagKind::Bool => "bool",
            FlagKind::I32 => "int32",
            FlagKind::U32 => "uint32",
            FlagKind::I64 => "int64",
            FlagKind::U64 => "uint64",
            FlagKind::F64 => "double",
        }
    }
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A type a flag can hold.
pub trait FlagValue: Clone + fmt::Display + Send + Sync + 'static {
    const KIND: FlagKind;

    fn parse_flag(text: &str) -> Result<Self, ValueError>;
}

impl FlagValue for String {
    const KIND: FlagKind = FlagKind::String;

    fn parse_flag(text: &str) -> Result<Self, ValueError> {
        Ok(text.to_string())
    }
}

impl FlagValue for bool {
    const KIND: FlagKind = FlagKind::Bool;

    fn parse_flag(text: &str) -> Result<Self, ValueError> {
        match text {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(ValueError::Bool(text.to_string())),
        }
    }
}

impl FlagValue for f64 {
    const KIND: FlagKind = FlagKind::F64;

    fn parse_flag(text: &str) -> Result<Self, ValueError> {
        let value: f64 = text
            .parse()
            .map_err(|_| ValueError::Double(text.to_string()))?;
        if value.is_infinite() && !text.to_ascii_lowercase().contains("inf") {
            return Err(ValueError::Range {
                kind: FlagKind::F64,
                value: text.to_string(),
            });
        }
        Ok(value)
    }
}

macro_rules! flag_integer {
    ($ty:ty, $kind:expr) => {
        impl FlagValue for $ty {
            const KIND: FlagKind = $kind;

            fn parse_flag(text: &str) -> Result<Self, ValueError> {
                let value = parse_integer(text, $kind)?;
                <$ty>::try_from(value).map_err(|_| ValueError::Range {
                    kind: $kind,
                    value: text.to_string(),
                })
            }
        }
    };
}

flag_integer!(i32, FlagKind::I32);
flag_integer!(u32, FlagKind::U32);
flag_integer!(i64, FlagKind::I64);
flag_integer!(u64, FlagKind::U64);

fn unit_shift(c: u8) -> Option<u32> {
    match c.to_ascii_lowercase() {
        b'k' => Some(10),
        b'm' => Some(20),
        b'g' => Some(30),
        b't' => Some(40),
        b'p' => Some(50),
        _ => None,
    }
}

/// Parse a signed integer the way `strtoll(_, _, 0)` does (decimal, `0x`
/// hex, leading-zero octal) with an optional k/m/g/t/p suffix multiplying
/// by a power of 1024. The result is widened to i128 so each caller can
/// range-check against its own type.
pub fn parse_integer(text: &str, kind: FlagKind) -> Result<i128, ValueError> {
    let invalid = || ValueError::Integer(text.to_string());
    let out_of_range = || ValueError::Range {
        kind,
        value: text.to_string(),
    };

    if text.is_empty() {
        return Ok(0);
    }

    let (body, shift) = match unit_shift(text.as_bytes()[text.len() - 1]) {
        Some(shift) => (&text[..text.len() - 1], shift),
        None => (text, 0),
    };

    let (negative, digits) = match body.as_bytes().first() {
        Some(b'-') => (true, &body[1..]),
        Some(b'+') => (false, &body[1..]),
        _ => (false, body),
    };

    let (radix, digits) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, hex)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(invalid());
    }

    let magnitude = u64::from_str_radix(digits, radix).map_err(|_| out_of_range())?;
    let value = if negative {
        -i128::from(magnitude)
    } else {
        i128::from(magnitude)
    };

    let limit = i128::from(u64::MAX);
    let value = value.checked_shl(shift).ok_or_else(out_of_range)?;
    if value > limit || value < i128::from(i64::MIN) {
        return Err(out_of_range());
    }
    Ok(value)
}
