mod cli_args;
mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use log;
use std::process;

use cli_args::{AggregationOverrides, Cli, Commands, ProjectConfigOpts};
use xaggregate_core::{AppError, CompactionLevel, Config};

fn main() {
    let cli_args = Cli::parse();

    setup_logging(cli_args.quiet, cli_args.verbose);

    let quiet = cli_args.quiet;

    log::debug!("CLI args parsed: {:?}", cli_args);

    let exit_code = match run_app(cli_args, quiet) {
        Ok(_) => {
            log::info!("Application finished successfully.");
            0
        }
        Err(e) => {
            let exit_code = exit_code_for(e.downcast_ref::<AppError>());

            if !quiet || exit_code == 1 {
                eprintln!("{} {:#}\n", "Error:".red().bold(), e);
            } else {
                log::error!("Application failed: {:#}", e);
            }

            exit_code
        }
    };
    log::debug!("Exiting with code {}", exit_code);
    process::exit(exit_code);
}

fn exit_code_for(core_err: Option<&AppError>) -> i32 {
    match core_err {
        Some(AppError::Config(_)) => 1,
        Some(AppError::TomlParse(_)) => 1,
        Some(AppError::InvalidArgument(_)) => 1,
        Some(AppError::Glob(_)) => 1,
        Some(AppError::Io(_)) => 2,
        Some(AppError::FileRead { .. }) => 2,
        Some(AppError::WalkDir(_)) => 2,
        Some(AppError::Ignore(_)) => 2,
        Some(AppError::FileWrite { .. }) => 3,
        Some(AppError::DirCreation { .. }) => 3,
        Some(AppError::TomlSerialize(_)) => 3,
        Some(AppError::JsonSerialize(_)) => 3,
        Some(_) => 1,
        None => 1,
    }
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}

fn run_app(cli: Cli, quiet: bool) -> Result<()> {
    match cli.command {
        None => {
            Cli::command().print_help()?;
        }
        Some(command) => match command {
            Commands::Completion(args) => {
                log::debug!("Executing 'completion' command...");
                commands::completion::handle_completion_command(&args, quiet)?;
            }
            Commands::Config(args) => {
                log::debug!("Executing 'config' command...");
                let project_root =
                    Config::determine_project_root(args.project_config.project_root.as_ref())
                        .context("Failed to determine project root for config command")?;
                commands::config::handle_config_command(&args, &project_root, quiet)?;
            }
            Commands::Generate(args) => {
                log::debug!("Executing 'generate' command...");
                commands::generate::handle_generate_command(args, quiet)?;
            }
            Commands::Tree(args) => {
                log::debug!("Executing 'tree' command...");
                commands::tree::handle_tree_command(args)?;
            }
            Commands::Debug(args) => {
                log::debug!("Executing 'debug' command...");
                commands::debug::handle_debug_command(args)?;
            }
        },
    }
    Ok(())
}

fn merge_config_with_cli_overrides(
    mut config: Config,
    args: &AggregationOverrides,
) -> Result<Config> {
    log::trace!("Applying CLI overrides to config...");

    if let Some(output) = &args.output {
        config.general.output_filename = output.clone();
    }
    if let Some(split_at) = args.split_at {
        config.split.split_at = split_at;
    }

    if let Some(level) = &args.compaction {
        config.compaction.level = level
            .parse::<CompactionLevel>()
            .context("Invalid --compaction value")?;
    }
    if args.keep_comments {
        config.compaction.comments = true;
    }
    if let Some(max_lines) = args.max_lines {
        config.compaction.max_lines_per_file = max_lines;
    }
    if let Some(truncate_lines) = args.truncate_lines {
        config.compaction.truncate_lines = truncate_lines;
    }

    if args.disable_tree {
        config.header.include_dirtree = false;
    }
    if args.enable_tree {
        config.header.include_dirtree = true;
    }
    if let Some(description) = &args.description {
        config.header.include_description = true;
        config.header.description = description.clone();
    }
    if args.disable_description {
        config.header.include_description = false;
    }

    if !args.extensions.is_empty() {
        config.filters.extensions = args.extensions.clone();
    }
    if !args.exclude_files.is_empty() {
        config.filters.exclude_files = args.exclude_files.clone();
    }
    if !args.include_files.is_empty() {
        config.filters.include_files = args.include_files.clone();
    }
    if !args.print_only.is_empty() {
        config.filters.print_only = args.print_only.clone();
    }
    if !args.ignore_dirs.is_empty() {
        config.filters.ignore_dirs = args.ignore_dirs.clone();
    }

    log::trace!("Config after CLI overrides: {:?}", config);
    Ok(config)
}

/// Loads the config file selected by `project_opts` and applies `overrides`.
pub fn load_config_for_command(
    project_root: &std::path::Path,
    project_opts: &ProjectConfigOpts,
    overrides: Option<&AggregationOverrides>,
) -> Result<Config> {
    let config_path = Config::resolve_config_path(
        project_root,
        project_opts.config_file.as_ref(),
        project_opts.disable_config_file,
    )
    .context("Failed to resolve configuration path")?;

    let config = match &config_path {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    match overrides {
        Some(args) => merge_config_with_cli_overrides(config, args),
        None => Ok(config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_config_values() {
        let args = AggregationOverrides {
            output: Some("bundle.md".into()),
            split_at: Some(0),
            compaction: Some("stubs".into()),
            keep_comments: true,
            disable_tree: true,
            extensions: vec!["rs".into()],
            include_files: vec!["notes.md|1-5".into()],
            ..Default::default()
        };
        let config = merge_config_with_cli_overrides(Config::default(), &args).unwrap();
        assert_eq!(config.general.output_filename, "bundle.md");
        assert_eq!(config.split.split_at, 0);
        assert_eq!(config.compaction.level, CompactionLevel::Stubs);
        assert!(config.compaction.comments);
        assert!(!config.header.include_dirtree);
        assert_eq!(config.filters.extensions, vec!["rs"]);
        assert_eq!(config.filters.include_files, vec!["notes.md|1-5"]);
    }

    #[test]
    fn absent_overrides_keep_config() {
        let mut base = Config::default();
        base.filters.ignore_dirs = vec![".git".into()];
        let config =
            merge_config_with_cli_overrides(base.clone(), &AggregationOverrides::default())
                .unwrap();
        assert_eq!(config, base);
    }

    #[test]
    fn exit_codes_by_error_kind() {
        assert_eq!(exit_code_for(Some(&AppError::Config("x".into()))), 1);
        assert_eq!(exit_code_for(Some(&AppError::WalkDir("x".into()))), 2);
        let write = AppError::FileWrite {
            path: "out.txt".into(),
            source: std::io::Error::other("disk full"),
        };
        assert_eq!(exit_code_for(Some(&write)), 3);
        assert_eq!(exit_code_for(None), 1);
    }
}
