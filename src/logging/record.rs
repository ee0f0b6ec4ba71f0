// SPDX-License-Identifier: Apache-2.0 OR MIT
// Growable byte buffer holding one formatted log line

use std::borrow::Cow;
use std::fmt;

/// Extra bytes reserved on every reallocation
const GROWTH_SLACK: usize = 32;

/// Significant digits used for floating point values (C `%.7g`)
const FLOAT_PRECISION: usize = 7;

/// One log line under construction.
///
/// Values are appended stream-style with [`put`](LogRecord::put) or through
/// `write!`. The content is raw bytes: no terminator, no validation. Capacity
/// only grows, by the requested amount plus a small slack.
#[derive(Clone, Default)]
pub struct LogRecord {
    buf: Vec<u8>,
}

impl LogRecord {
    pub fn new() -> Self {
        Self::with_capacity(GROWTH_SLACK)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Content bytes (not NUL-terminated)
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.buf
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buf)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Reset the cursor, keeping the allocation.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Make sure the capacity is at least `n` bytes.
    pub fn reserve(&mut self, n: usize) {
        if n > self.buf.capacity() {
            self.buf.reserve_exact(n - self.buf.len());
        }
    }

    /// Set the size to `n`, zero-filling when growing.
    pub fn resize(&mut self, n: usize) {
        if n > self.buf.len() {
            self.grow(n - self.buf.len());
        }
        self.buf.resize(n, 0);
    }

    /// Append raw bytes.
    pub fn append(&mut self, data: &[u8]) -> &mut Self {
        self.grow(data.len());
        self.buf.extend_from_slice(data);
        self
    }

    /// Append a value in its log representation.
    pub fn put<T: Appendable>(&mut self, value: T) -> &mut Self {
        value.append_to(self);
        self
    }

    #[inline]
    fn grow(&mut self, additional: usize) {
        if self.buf.capacity() - self.buf.len() < additional {
            let target = self.buf.capacity() + additional + GROWTH_SLACK;
            self.buf.reserve_exact(target - self.buf.len());
        }
    }
}

impl fmt::Write for LogRecord {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.append(s.as_bytes());
        Ok(())
    }
}

impl fmt::Debug for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogRecord")
            .field("size", &self.size())
            .field("capacity", &self.capacity())
            .field("data", &self.to_string_lossy())
            .finish()
    }
}

/// Values that know how to render themselves into a [`LogRecord`].
pub trait Appendable {
    fn append_to(&self, record: &mut LogRecord);
}

impl<T: Appendable + ?Sized> Appendable for &T {
    fn append_to(&self, record: &mut LogRecord) {
        (**self).append_to(record)
    }
}

impl Appendable for str {
    fn append_to(&self, record: &mut LogRecord) {
        record.append(self.as_bytes());
    }
}

impl Appendable for String {
    fn append_to(&self, record: &mut LogRecord) {
        record.append(self.as_bytes());
    }
}

impl Appendable for [u8] {
    fn append_to(&self, record: &mut LogRecord) {
        record.append(self);
    }
}

impl Appendable for bool {
    fn append_to(&self, record: &mut LogRecord) {
        record.append(if *self { b"true" } else { b"false" });
    }
}

impl Appendable for char {
    fn append_to(&self, record: &mut LogRecord) {
        let mut utf8 = [0u8; 4];
        record.append(self.encode_utf8(&mut utf8).as_bytes());
    }
}

macro_rules! appendable_integer {
    ($($ty:ty),*) => {
        $(
            impl Appendable for $ty {
                fn append_to(&self, record: &mut LogRecord) {
                    use std::fmt::Write;
                    let _ = write!(record, "{}", self);
                }
            }
        )*
    };
}

appendable_integer!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

impl Appendable for f64 {
    fn append_to(&self, record: &mut LogRecord) {
        append_general(record, *self);
    }
}

impl Appendable for f32 {
    fn append_to(&self, record: &mut LogRecord) {
        append_general(record, f64::from(*self));
    }
}

impl<T> Appendable for *const T {
    fn append_to(&self, record: &mut LogRecord) {
        use std::fmt::Write;
        let _ = write!(record, "{:#x}", *self as usize);
    }
}

impl<T> Appendable for *mut T {
    fn append_to(&self, record: &mut LogRecord) {
        self.cast_const().append_to(record)
    }
}

/// Render `value` like C's `%.7g`.
fn append_general(record: &mut LogRecord, value: f64) {
    if value.is_nan() {
        record.append(b"nan");
        return;
    }
    if value.is_infinite() {
        record.append(if value > 0.0 { b"inf" as &[u8] } else { b"-inf" });
        return;
    }
    if value == 0.0 {
        record.append(if value.is_sign_negative() { b"-0" as &[u8] } else { b"0" });
        return;
    }

    let scientific = format!("{:.*e}", FLOAT_PRECISION - 1, value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= FLOAT_PRECISION as i32 {
        record.append(trim_fraction(mantissa).as_bytes());
        use std::fmt::Write;
        let sign = if exponent < 0 { '-' } else { '+' };
        let _ = write!(record, "e{}{:02}", sign, exponent.abs());
    } else {
        let decimals = (FLOAT_PRECISION as i32 - 1 - exponent) as usize;
        let fixed = format!("{:.*}", decimals, value);
        record.append(trim_fraction(&fixed).as_bytes());
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// Kernel thread id of the caller (truncated to u32)
pub fn current_thread_id() -> u32 {
    #[cfg(target_os = "linux")]
    {
        // SAFETY: gettid has no preconditions
        unsafe { libc::gettid() as u32 }
    }
    #[cfg(not(target_os = "linux"))]
    {
        // SAFETY: pthread_self has no preconditions
        unsafe { libc::pthread_self() as usize as u32 }
    }
}
