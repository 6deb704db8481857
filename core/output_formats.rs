use crate::entry::LineRange;
use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::io;
use std::path::PathBuf;

pub const RULE_WIDTH: usize = 80;
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Separator written after every block.
pub static RULE: Lazy<String> = Lazy::new(|| "=".repeat(RULE_WIDTH));

/// One file's rendered section of the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentBlock {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<LineRange>,
    pub body: String,
    pub read_failed: bool,
}

impl ContentBlock {
    pub fn new(path: String, range: Option<LineRange>, body: String) -> Self {
        Self {
            path,
            range,
            body,
            read_failed: false,
        }
    }

    pub fn read_error(path: String, error: &io::Error) -> Self {
        Self {
            path,
            range: None,
            body: format!("Error reading file: {}\n", error),
            read_failed: true,
        }
    }

    pub fn render(&self) -> String {
        let range_info = self
            .range
            .map(|r| format!(" ({})", r))
            .unwrap_or_default();
        format!(
            "\n[-] This file: {}{} | Contents:\n{}\n{}\n",
            self.path, range_info, self.body, *RULE
        )
    }
}

pub fn run_header(timestamp: &DateTime<Local>) -> String {
    format!("Aggregated on: {}\n{}\n", timestamp.format(TIMESTAMP_FORMAT), *RULE)
}

pub fn description_block(description: &str) -> String {
    format!("Description:\n{}\n{}\n", description, *RULE)
}

pub fn tree_block(tree: &str) -> String {
    format!("Project Directory Tree:\n{}\n{}\n", tree, *RULE)
}

/// Run header, then the optional description and tree blocks, as one block.
pub fn header_block(
    timestamp: &DateTime<Local>,
    description: Option<&str>,
    tree: Option<&str>,
) -> String {
    let mut header = run_header(timestamp);
    if let Some(text) = description {
        header.push_str(&description_block(text));
    }
    if let Some(text) = tree {
        header.push_str(&tree_block(text));
    }
    header
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkInfo {
    pub current_part: usize,
    pub total_parts: usize,
}

/// An artifact written by a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkFile {
    pub path: PathBuf,
    pub lines: usize,
    pub bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_info: Option<ChunkInfo>,
}
