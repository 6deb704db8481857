use crate::cli_args::GenerateArgs;
use crate::load_config_for_command;
use crate::output;
use anyhow::{Context, Result};
use colored::Colorize;
use log;
use xaggregate_core::{Aggregator, Config, ResolvedConfig};

pub fn handle_generate_command(args: GenerateArgs, quiet: bool) -> Result<()> {
    let project_root = Config::determine_project_root(args.project_config.project_root.as_ref())
        .context("Failed to determine project root")?;
    log::info!("Project root determined: {}", project_root.display());

    let config = load_config_for_command(
        &project_root,
        &args.project_config,
        Some(&args.overrides),
    )
    .context("Failed to load configuration")?;

    let aggregator = Aggregator::new(ResolvedConfig::resolve(&config, &project_root));

    if args.stdout {
        log::debug!("Writing aggregated output to stdout...");
        let assembled = aggregator
            .assemble()
            .context("Failed to assemble aggregated output")?;
        return output::write_to_stdout(&assembled.text());
    }

    log::info!("Starting aggregation for: {}", project_root.display());
    let report = aggregator
        .aggregate()
        .context("Failed to aggregate project files")?;

    if !quiet {
        output::print_report_table(&report, &project_root);
        if report.read_errors > 0 {
            println!(
                "{} {} file(s) could not be read; see the error blocks in the output.",
                "⚠️".yellow(),
                report.read_errors
            );
        }
        println!(
            "{} Aggregation complete: {} file(s) written.",
            "✅".green(),
            report.written.len().to_string().blue()
        );
    }
    Ok(())
}
