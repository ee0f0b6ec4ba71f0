// SPDX-License-Identifier: Apache-2.0 OR MIT
// Config file reader: `name = value` lines with comments and continuations

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A logical line: continuations joined, blanks normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConfigLine {
    /// 1-based number of the last physical line it spans
    pub number: usize,
    pub text: String,
}

/// One `name = value` assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Assignment {
    /// Line started with `!`: re-applied by the hot-reload thread
    pub hot: bool,
    pub name: String,
    pub value: String,
}

/// Tabs, double quotes and the ideographic space count as blanks.
pub(crate) fn normalize(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\t' | '"' | '\u{3000}' => ' ',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Split `content` into logical lines. A line ending in `\` continues on the
/// next one.
pub(crate) fn logical_lines(content: &str) -> Vec<ConfigLine> {
    let mut lines = Vec::new();
    let mut pending = String::new();
    let mut number = 0;

    for raw in content.lines() {
        number += 1;
        let s = normalize(raw);
        match s.strip_suffix('\\') {
            Some(head) => pending.push_str(&normalize(head)),
            None => {
                pending.push_str(&s);
                lines.push(ConfigLine {
                    number,
                    text: std::mem::take(&mut pending),
                });
            }
        }
    }
    if !pending.is_empty() {
        lines.push(ConfigLine {
            number,
            text: pending,
        });
    }
    lines
}

/// Parse one logical line.
///
/// `Ok(None)` for blank and comment lines; `Err(())` when the line has no
/// `=` or starts with it.
pub(crate) fn parse_line(text: &str) -> Result<Option<Assignment>, ()> {
    let line = normalize(text);
    if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
        return Ok(None);
    }

    let line = match [line.find('#'), line.find("//")].into_iter().flatten().min() {
        Some(pos) => &line[..pos],
        None => &line[..],
    };

    let pos = match line.find('=') {
        Some(pos) if pos > 0 => pos,
        _ => return Err(()),
    };

    let hot = line.starts_with('!');
    let name_start = usize::from(hot);
    Ok(Some(Assignment {
        hot,
        name: normalize(&line[name_start..pos]),
        value: normalize(&line[pos + 1..]),
    }))
}

/// Tracks the modification stamp of a config file between polls.
#[derive(Debug)]
pub(crate) struct ConfigWatch {
    path: PathBuf,
    stamp: Option<(SystemTime, u64)>,
}

impl ConfigWatch {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stamp = stamp(&path);
        Self { path, stamp }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True once per change of the file's mtime or size. A missing file
    /// never counts as changed.
    pub fn changed(&mut self) -> bool {
        match stamp(&self.path) {
            Some(now) if Some(now) != self.stamp => {
                self.stamp = Some(now);
                true
            }
            _ => false,
        }
    }

    pub fn read(&self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }
}

fn stamp(path: &Path) -> Option<(SystemTime, u64)> {
    let meta = fs::metadata(path).ok()?;
    Some((meta.modified().ok()?, meta.len()))
}
