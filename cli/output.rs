use anyhow::{Context, Result};
use colored::*;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table, presets::UTF8_FULL};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use xaggregate_core::AggregateReport;

use crate::cli_args::FormatOutputOpts;

/// Prints `data` as JSON/TOML when a format was requested, otherwise `plain_text`.
pub fn print_data_or_text<T: Serialize>(
    data: &T,
    plain_text: Option<String>,
    format_opts: &FormatOutputOpts,
    default_format: &str,
) -> Result<()> {
    let format = format_opts
        .format
        .as_deref()
        .unwrap_or(default_format)
        .to_lowercase();

    match (format.as_str(), plain_text) {
        ("text", Some(text)) => write_to_stdout(&text),
        ("toml", _) => {
            let content =
                toml::to_string_pretty(data).context("Failed to serialize output to TOML")?;
            write_to_stdout(&content)
        }
        _ => {
            let content = serde_json::to_string_pretty(data)
                .context("Failed to serialize output to JSON")?;
            write_to_stdout(&content)
        }
    }
}

pub fn write_to_stdout(content: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(content.as_bytes())
        .context("Failed to write to stdout")?;
    if !content.ends_with('\n') {
        handle
            .write_all(b"\n")
            .context("Failed to write newline to stdout")?;
    }
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}

pub fn print_report_table(report: &AggregateReport, project_root: &Path) {
    println!();
    println!("{}", " Aggregation Summary ".green().bold().underline());
    println!(
        "{:<20} {}",
        "Files Included:".green(),
        report.files_included.to_string().cyan()
    );
    if report.read_errors > 0 {
        println!(
            "{:<20} {}",
            "Read Errors:".green(),
            report.read_errors.to_string().yellow()
        );
    }
    if let (Some(dirs), Some(files)) = (report.tree_directories, report.tree_files) {
        println!(
            "{:<20} {} directories, {} files",
            "Tree:".green(),
            dirs.to_string().cyan(),
            files.to_string().cyan()
        );
    }

    if report.written.is_empty() {
        println!("\n{}", "(No output written)".yellow());
    } else {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("Output").fg(Color::Green),
            Cell::new("Part").fg(Color::Green),
            Cell::new("Lines").fg(Color::Green),
            Cell::new("Bytes").fg(Color::Green),
        ]);
        for artifact in &report.written {
            let display_path = pathdiff::diff_paths(&artifact.path, project_root)
                .unwrap_or_else(|| artifact.path.clone());
            let part = artifact
                .chunk_info
                .as_ref()
                .map(|info| format!("{}/{}", info.current_part, info.total_parts))
                .unwrap_or_else(|| "-".to_string());
            table.add_row(vec![
                Cell::new(display_path.display()).fg(Color::Cyan),
                Cell::new(part).set_alignment(CellAlignment::Right),
                Cell::new(artifact.lines).set_alignment(CellAlignment::Right),
                Cell::new(artifact.bytes)
                    .set_alignment(CellAlignment::Right)
                    .fg(Color::DarkGrey),
            ]);
        }
        println!("\n{table}");
    }
    println!();
}
