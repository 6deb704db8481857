//! Per-file content pipeline.
//!
//! Stages run in a fixed order: range slice, early line cap, stubs, comment
//! removal, whitespace compaction, post line cap.

use crate::config::{CompactionLevel, ResolvedConfig};
use crate::entry::LineRange;
use crate::gather::FileEntry;
use crate::output_formats::ContentBlock;
use crate::stubs;
use log;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;

static BLOCK_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("block comment pattern is valid"));

pub const EARLY_CAP_NOTE: &str = "early cap: max_lines_per_file";

/// How comments are recognized for a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// Whole lines starting with `#`.
    Hash,
    /// `/* */` blocks and `//` line suffixes.
    Slash,
    /// Left untouched.
    Markup,
    /// `/* */` blocks only.
    Style,
    /// `/* */` blocks, then anything after `#` or `//` on each line.
    Fallback,
}

impl CommentStyle {
    /// `extension` is lowercased and includes the leading dot.
    pub fn from_extension(extension: &str) -> Self {
        match extension.trim_start_matches('.') {
            "py" | "pyw" | "sh" | "bash" | "zsh" | "rb" | "pl" | "r" | "yaml" | "yml"
            | "toml" => CommentStyle::Hash,
            "js" | "mjs" | "cjs" | "jsx" | "ts" | "tsx" | "java" | "c" | "h" | "cc" | "cpp"
            | "hpp" | "cs" | "go" | "rs" | "swift" | "kt" | "scala" | "dart" => {
                CommentStyle::Slash
            }
            "html" | "htm" | "xml" | "svg" => CommentStyle::Markup,
            "css" | "scss" | "less" => CommentStyle::Style,
            _ => CommentStyle::Fallback,
        }
    }
}

pub fn remove_comments(content: &str, extension: &str) -> String {
    match CommentStyle::from_extension(extension) {
        CommentStyle::Hash => content
            .lines()
            .filter(|line| !line.trim_start().starts_with('#'))
            .collect::<Vec<_>>()
            .join("\n"),
        CommentStyle::Slash => {
            let without_blocks = BLOCK_COMMENT.replace_all(content, "");
            without_blocks
                .lines()
                .map(|line| line.split_once("//").map_or(line, |(code, _)| code))
                .collect::<Vec<_>>()
                .join("\n")
        }
        CommentStyle::Markup => content.to_string(),
        CommentStyle::Style => BLOCK_COMMENT.replace_all(content, "").into_owned(),
        CommentStyle::Fallback => {
            // Also cuts `#` and `//` inside strings and URLs.
            let without_blocks = BLOCK_COMMENT.replace_all(content, "");
            without_blocks
                .lines()
                .map(|line| {
                    let line = line.split_once('#').map_or(line, |(code, _)| code);
                    line.split_once("//").map_or(line, |(code, _)| code)
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}

/// Drops blank lines and trailing whitespace. Applying it twice changes nothing.
pub fn compact_whitespace(content: &str) -> String {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Markers always start on a fresh line.
fn append_marker(mut text: String, marker: &str) -> String {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text.push_str(marker);
    text
}

/// Keeps the first `limit` lines and notes how many were dropped.
/// A limit of zero disables the cap.
pub fn truncate_by_lines(text: &str, limit: usize, note: &str) -> String {
    if limit == 0 {
        return text.to_string();
    }
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    if lines.len() <= limit {
        return text.to_string();
    }
    let omitted = lines.len() - limit;
    append_marker(
        lines[..limit].concat(),
        &format!("... (truncated, {} more lines omitted; {})", omitted, note),
    )
}

pub fn slice_lines(content: &str, range: LineRange) -> String {
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    let total = lines.len();
    let start = range.start().saturating_sub(1).min(total);
    let end = range.end().min(total);
    let snippet = lines[start..end].concat();
    if range.end() < total {
        append_marker(
            snippet,
            &format!("... (remaining {} lines omitted)", total - range.end()),
        )
    } else {
        snippet
    }
}

/// Runs every pipeline stage over already-decoded file content.
pub fn transform_content(
    content: &str,
    extension: &str,
    range: Option<LineRange>,
    config: &ResolvedConfig,
) -> String {
    let mut text = match range {
        Some(range) => slice_lines(content, range),
        None => content.to_string(),
    };

    if let Some(cap) = config.max_lines_per_file {
        text = truncate_by_lines(&text, cap, EARLY_CAP_NOTE);
    }

    if config.compaction_level == CompactionLevel::Stubs {
        text = stubs::create_stubs(&text, extension);
    }

    if !config.keep_comments {
        text = remove_comments(&text, extension);
    }

    if config.compaction_level == CompactionLevel::Whitespace {
        text = compact_whitespace(&text);
    }

    if config.compaction_level != CompactionLevel::Stubs {
        if let Some(cap) = config.truncate_lines {
            text = truncate_by_lines(&text, cap, &format!("post cap: truncate_lines={}", cap));
        }
    }

    text
}

/// Reads and transforms one file. Read failures become an error block.
pub fn transform_file(entry: &FileEntry, config: &ResolvedConfig) -> ContentBlock {
    let display_path = entry.relative_path.display().to_string();
    let bytes = match fs::read(&entry.path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("Error reading file {}: {}", entry.path.display(), e);
            return ContentBlock::read_error(display_path, &e);
        }
    };
    let content = String::from_utf8_lossy(&bytes);
    let range = config.line_range_for(&entry.name_lower);
    log::trace!(
        "Transforming {} ({} bytes, range: {:?})",
        display_path,
        bytes.len(),
        range
    );
    let body = transform_content(&content, &entry.ext_lower, range, config);
    ContentBlock::new(display_path, range, body)
}
