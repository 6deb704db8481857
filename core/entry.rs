//! Parsing of `name`, `name|start-end` and `name|N` file entries.

use log;
use serde::Serialize;
use std::fmt;

pub const RANGE_SEPARATOR: char = '|';

/// A 1-based, inclusive line range. `start >= 1` and `start <= end` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineRange {
    start: usize,
    end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Option<Self> {
        if start == 0 || start > end {
            return None;
        }
        Some(Self { start, end })
    }

    /// Range covering the first `n` lines.
    pub fn first(n: usize) -> Option<Self> {
        Self::new(1, n)
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lines {}-{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySpec {
    pub filename: String,
    pub range: Option<LineRange>,
}

impl EntrySpec {
    pub fn parse(entry: &str) -> Self {
        let (filename, range) = parse_entry(entry);
        Self { filename, range }
    }

    pub fn key(&self) -> String {
        self.filename.to_lowercase()
    }
}

/// Splits a raw entry into its filename and optional line range.
///
/// Malformed range text never fails: a warning is logged and the whole raw
/// entry is returned as the filename with no range.
pub fn parse_entry(entry: &str) -> (String, Option<LineRange>) {
    let Some((filename, range_str)) = entry.split_once(RANGE_SEPARATOR) else {
        return (entry.to_string(), None);
    };

    if let Some((start_str, end_str)) = range_str.split_once('-') {
        let parsed = start_str
            .trim()
            .parse::<usize>()
            .ok()
            .zip(end_str.trim().parse::<usize>().ok())
            .and_then(|(start, end)| LineRange::new(start, end));
        return match parsed {
            Some(range) => (filename.to_string(), Some(range)),
            None => {
                log::warn!("Bad range in '{}'", entry);
                (entry.to_string(), None)
            }
        };
    }

    match range_str.trim().parse::<usize>().ok().and_then(LineRange::first) {
        Some(range) => (filename.to_string(), Some(range)),
        None => {
            log::warn!("Bad line limit in '{}'", entry);
            (entry.to_string(), None)
        }
    }
}
