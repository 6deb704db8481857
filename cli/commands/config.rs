use crate::cli_args::ConfigArgs;
use crate::output;
use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use xaggregate_core::Config;
use xaggregate_core::config::{DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILENAME};

pub fn handle_config_command(args: &ConfigArgs, project_root: &Path, quiet: bool) -> Result<()> {
    let content = Config::default()
        .to_toml_string()
        .context("Failed to serialize default configuration")?;

    if !args.save {
        return output::write_to_stdout(&content);
    }

    let save_dir = project_root.join(DEFAULT_CONFIG_DIR);
    let save_path = save_dir.join(DEFAULT_CONFIG_FILENAME);

    if save_path.exists() {
        if !quiet {
            print!(
                "{} Config file already exists at '{}'. Overwrite? [{}/{}] ",
                "⚠️".yellow(),
                save_path.display().to_string().cyan(),
                "y".green(),
                "N".red()
            );
            io::stdout().flush().context("Failed to flush stdout")?;
            let mut response = String::new();
            io::stdin()
                .read_line(&mut response)
                .context("Failed to read user input")?;
            if !response.trim().eq_ignore_ascii_case("y") {
                println!("Save cancelled.");
                return Ok(());
            }
        } else {
            anyhow::bail!(
                "Target file '{}' exists. Overwrite prevented in quiet mode.",
                save_path.display()
            );
        }
    }

    fs::create_dir_all(&save_dir)
        .with_context(|| format!("Failed to create directory {}", save_dir.display()))?;
    fs::write(&save_path, &content)
        .with_context(|| format!("Failed to write file {}", save_path.display()))?;

    if !quiet {
        println!(
            "{} Default config saved to: {}",
            "✅".green(),
            save_path.display().to_string().blue()
        );
    }
    Ok(())
}
