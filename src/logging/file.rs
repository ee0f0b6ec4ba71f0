// SPDX-License-Identifier: Apache-2.0 OR MIT
// Append-only log file handle and naming helpers

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};

const WRITE_BUFFER: usize = 64 * 1024;

/// Where log files go and how they are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPaths {
    pub dir: PathBuf,
    /// Empty, or ending with '.'
    pub prefix: String,
    pub program: String,
}

impl LogPaths {
    pub fn new(dir: impl Into<PathBuf>, prefix: &str, program: &str) -> Self {
        let mut prefix = prefix.to_string();
        if !prefix.is_empty() && !prefix.ends_with('.') {
            prefix.push('.');
        }
        Self {
            dir: dir.into(),
            prefix,
            program: program.to_string(),
        }
    }

    /// `<prefix><program><rest>`
    pub fn file_name(&self, rest: &str) -> String {
        format!("{}{}{}", self.prefix, self.program, rest)
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

/// An append-mode file that remembers its path and the bytes it holds.
///
/// Closing keeps the path so [`exists`](LogFile::exists) still answers for
/// the last opened file.
#[derive(Debug, Default)]
pub struct LogFile {
    out: Option<BufWriter<File>>,
    path: Option<PathBuf>,
    size: u64,
}

impl LogFile {
    pub const fn new() -> Self {
        Self {
            out: None,
            path: None,
            size: 0,
        }
    }

    /// Open `path` for appending, creating it when missing.
    pub fn open(&mut self, path: impl Into<PathBuf>) -> io::Result<()> {
        let _ = self.close();
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        self.size = file.metadata()?.len();
        self.out = Some(BufWriter::with_capacity(WRITE_BUFFER, file));
        self.path = Some(path);
        Ok(())
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.out.is_some()
    }

    /// Whether the last opened path is still present on disk.
    pub fn exists(&self) -> bool {
        self.path.as_deref().is_some_and(Path::exists)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Bytes in the file, including buffered ones.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn write(&mut self, data: &[u8]) -> io::Result<()> {
        let out = self.out.as_mut().ok_or_else(not_open)?;
        out.write_all(data)?;
        self.size += data.len() as u64;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match self.out.as_mut() {
            Some(out) => out.flush(),
            None => Ok(()),
        }
    }

    /// Flush and push the data to the device.
    pub fn sync(&mut self) -> io::Result<()> {
        match self.out.as_mut() {
            Some(out) => {
                out.flush()?;
                out.get_ref().sync_data()
            }
            None => Ok(()),
        }
    }

    pub fn close(&mut self) -> io::Result<()> {
        match self.out.take() {
            Some(mut out) => out.flush(),
            None => Ok(()),
        }
    }

    pub fn raw_fd(&self) -> Option<RawFd> {
        self.out.as_ref().map(|out| out.get_ref().as_raw_fd())
    }
}

fn not_open() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "log file is not open")
}

/// Point `link` at `target` (a name relative to the link's directory),
/// replacing whatever was there.
pub fn update_symlink(target: &str, link: &Path) -> io::Result<()> {
    match fs::remove_file(link) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
        _ => {}
    }
    std::os::unix::fs::symlink(target, link)
}
