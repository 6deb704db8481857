use crate::cli_args::TreeArgs;
use crate::load_config_for_command;
use crate::output;
use anyhow::{Context, Result};
use log;
use xaggregate_core::{Aggregator, Config, ResolvedConfig};

pub fn handle_tree_command(args: TreeArgs) -> Result<()> {
    let project_root = Config::determine_project_root(args.project_config.project_root.as_ref())
        .context("Failed to determine project root")?;

    let mut config = load_config_for_command(&project_root, &args.project_config, None)
        .context("Failed to load configuration for tree command")?;
    config.filters.ignore_dirs.extend(args.ignore_dirs);
    config.filters.exclude_files.extend(args.exclude_files);

    let aggregator = Aggregator::new(ResolvedConfig::resolve(&config, &project_root));
    let tree = aggregator
        .render_tree()
        .context("Failed to render directory tree")?;
    log::debug!(
        "Tree rendered: {} directories, {} files",
        tree.directories,
        tree.files
    );
    output::write_to_stdout(&tree.text)
}
