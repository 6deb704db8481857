use crate::cli_args::DebugArgs;
use crate::load_config_for_command;
use crate::output::print_data_or_text;
use anyhow::{Context, Result};
use colored::*;
use log;
use serde::Serialize;
use toml;
use xaggregate_core::{Aggregator, Config, LineRange, ResolvedConfig, SelectionOrigin};

#[derive(Debug, Serialize)]
struct PlannedFile {
    path: String,
    origin: SelectionOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<LineRange>,
}

#[derive(Debug, Serialize)]
struct DebugInfo<'a> {
    effective_config: &'a Config,
    resolved: &'a ResolvedConfig,
    planned_files: Vec<PlannedFile>,
}

pub fn handle_debug_command(args: DebugArgs) -> Result<()> {
    let project_root = Config::determine_project_root(args.project_config.project_root.as_ref())
        .context("Failed to determine project root")?;
    log::info!("Project root determined: {}", project_root.display());

    let config = load_config_for_command(
        &project_root,
        &args.project_config,
        Some(&args.overrides),
    )
    .context("Failed to load configuration for debug command")?;

    let aggregator = Aggregator::new(ResolvedConfig::resolve(&config, &project_root));
    log::debug!("Debug: Gathering planned files...");
    let planned_files = aggregator
        .plan()
        .context("Failed to gather file list for debug")?
        .into_iter()
        .map(|file| PlannedFile {
            range: aggregator.config().line_range_for(&file.entry.name_lower),
            path: file.entry.relative_path.display().to_string(),
            origin: file.origin,
        })
        .collect();

    let debug_data = DebugInfo {
        effective_config: &config,
        resolved: aggregator.config(),
        planned_files,
    };

    if args.format_output.format.is_none() {
        print_debug_info_pretty(&debug_data)
    } else {
        print_data_or_text(&debug_data, None, &args.format_output, "json")
    }
}

fn print_debug_info_pretty(debug_info: &DebugInfo) -> Result<()> {
    println!(
        "{}",
        "\n--- Effective Configuration ---"
            .green()
            .bold()
            .underline()
    );
    let config_toml = toml::to_string_pretty(debug_info.effective_config)
        .context("Failed to serialize effective config to TOML")?;
    println!("{}", config_toml);

    let resolved = debug_info.resolved;
    println!("{}", "\n--- Output ---".green().bold().underline());
    if resolved.split_at == 0 {
        println!("- {}", resolved.output_path().display().to_string().cyan());
    } else {
        println!(
            "- {} {}",
            resolved.chunk_path(1).display().to_string().cyan(),
            format!("(split every {} lines)", resolved.split_at).dimmed()
        );
    }

    println!(
        "{}",
        "\n--- Files To Include ---".green().bold().underline()
    );
    if debug_info.planned_files.is_empty() {
        println!("{}", "(None)".dimmed());
    }
    for file in &debug_info.planned_files {
        let origin = match file.origin {
            SelectionOrigin::Walked => "".normal(),
            SelectionOrigin::ForceIncluded => " (force-included)".yellow(),
            SelectionOrigin::PrintOnly => " (print-only)".magenta(),
        };
        let range = file
            .range
            .map(|r| format!(" ({})", r).dimmed())
            .unwrap_or_else(|| "".normal());
        println!("- {}{}{}", file.path.cyan(), range, origin);
    }

    println!("{}", "\n--- End Debug Info ---".green().bold());
    Ok(())
}
