// SPDX-License-Identifier: Apache-2.0 OR MIT
// Severity levels for the leveled logger

/// Log severity levels (lower is less severe)
///
/// Visibility cascades upward: the file of a level contains every record of
/// that level and above, except FATAL, which only lands in its own file.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Normal operation
    Info = 0,
    /// Something unexpected that the process recovered from
    Warning = 1,
    /// A failed operation
    Error = 2,
    /// Unrecoverable: written synchronously, then the process terminates
    Fatal = 3,
}

impl Level {
    /// All levels, in file index order
    pub const ALL: [Level; 4] = [Level::Info, Level::Warning, Level::Error, Level::Fatal];

    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Name used as file suffix and symlink suffix
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }

    /// Single-letter line prefix
    pub const fn as_char(self) -> u8 {
        match self {
            Level::Info => b'I',
            Level::Warning => b'W',
            Level::Error => b'E',
            Level::Fatal => b'F',
        }
    }

    /// Create from u8 value (returns None if invalid)
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Level::Info),
            1 => Some(Level::Warning),
            2 => Some(Level::Error),
            3 => Some(Level::Fatal),
            _ => None,
        }
    }

    /// Levels whose files receive a record of this level: INFO up to the
    /// level itself, except FATAL, which only goes to the FATAL file
    pub fn cascade(self) -> impl Iterator<Item = Level> {
        let range = match self {
            Level::Fatal => Level::Fatal.as_u8()..=Level::Fatal.as_u8(),
            level => 0..=level.as_u8(),
        };
        range.filter_map(Level::from_u8)
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
