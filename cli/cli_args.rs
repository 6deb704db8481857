use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct ProjectConfigOpts {
    #[arg(
        long,
        help = "Specify the directory to aggregate (default: current dir).",
        help_heading = "Project Setup",
        value_name = "PATH"
    )]
    pub project_root: Option<PathBuf>,

    #[arg(
        long,
        help = "Specify path/filename of the TOML config file (default: .xtools/xaggregate/xaggregate.toml).",
        value_name = "CONFIG_FILE",
        conflicts_with = "disable_config_file",
        help_heading = "Project Setup"
    )]
    pub config_file: Option<String>,

    #[arg(
        long,
        help = "Disable loading any TOML config file.",
        conflicts_with = "config_file",
        help_heading = "Project Setup"
    )]
    pub disable_config_file: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FormatOutputOpts {
    #[arg(short = 'f', long, help = "Print structured output instead of text.", value_name = "FORMAT", value_parser = ["json", "toml"], help_heading = "Output Formatting")]
    pub format: Option<String>,
}

#[derive(Parser, Debug)]
#[command(
    name = "xaggregate",
    author,
    version,
    about = "Flatten a project directory into compact, pasteable text files.",
    long_about = "xaggregate walks a project directory, selects files by extension and name rules, \ncompacts them (whitespace, comments, structural stubs) and writes one or more \nnumbered text artifacts with a directory tree header.",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  xaggregate generate --compaction stubs --split-at 4000\n  xaggregate generate --include 'notes.md|1-40' --ext py --ext js\n  xaggregate tree --ignore-dir node_modules\n  xaggregate debug -f json",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase message verbosity (-v, -vv, -vvv).")]
    pub verbose: u8,

    #[arg(
        short,
        long,
        global = true,
        help = "Silence informational messages and warnings."
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    #[command(
        visible_alias = "g",
        visible_alias = "gen",
        about = "Aggregate the project into output file(s)."
    )]
    Generate(GenerateArgs),

    #[command(visible_alias = "t", about = "Print the project directory tree.")]
    Tree(TreeArgs),

    #[command(
        visible_alias = "d",
        about = "Show effective configuration and planned file inclusions."
    )]
    Debug(DebugArgs),

    #[command(about = "Generate or save shell completion scripts.")]
    Completion(CompletionArgs),

    #[command(about = "Show or save the default configuration file structure.")]
    Config(ConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,

    #[arg(
        long,
        help = "Print the unsplit output to standard output instead of writing files.",
        help_heading = "Output Control"
    )]
    pub stdout: bool,

    #[clap(flatten)]
    pub overrides: AggregationOverrides,
}

#[derive(Args, Debug, Clone)]
pub struct TreeArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,

    #[arg(long = "ignore-dir", value_name = "DIR", action = clap::ArgAction::Append, help = "Add a directory name or path to skip.", help_heading = "Content Filtering")]
    pub ignore_dirs: Vec<String>,

    #[arg(long = "exclude", value_name = "NAME", action = clap::ArgAction::Append, help = "Add a file name or stem to hide.", help_heading = "Content Filtering")]
    pub exclude_files: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DebugArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
    #[clap(flatten)]
    pub format_output: FormatOutputOpts,
    #[clap(flatten)]
    pub overrides: AggregationOverrides,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionArgs {
    #[arg(
        long,
        value_name = "SHELL",
        help = "Shell to generate completions for (fish, bash, zsh) [default: fish]"
    )]
    pub shell: Option<String>,
    #[arg(
        long,
        help = "Save completion script to default location (prompts overwrite)."
    )]
    pub save: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
    #[arg(
        long,
        help = "Save default config structure to default path (prompts overwrite)."
    )]
    pub save: bool,
}

/// Flags that override values from the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct AggregationOverrides {
    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Output file name; relative paths resolve against the project root.",
        help_heading = "Output Control"
    )]
    pub output: Option<String>,

    #[arg(
        long,
        value_name = "LINES",
        help = "Line budget per output file; 0 writes a single file [default: 8400].",
        help_heading = "Output Control"
    )]
    pub split_at: Option<usize>,

    #[arg(long, value_name = "LEVEL", value_parser = ["none", "whitespace", "stubs"], help = "Compaction level [default: whitespace].", help_heading = "Compaction")]
    pub compaction: Option<String>,

    #[arg(
        long,
        help = "Keep comments in file contents.",
        help_heading = "Compaction"
    )]
    pub keep_comments: bool,

    #[arg(
        long,
        value_name = "LINES",
        help = "Hard cap on lines read per file, applied before compaction.",
        help_heading = "Compaction"
    )]
    pub max_lines: Option<usize>,

    #[arg(
        long,
        value_name = "LINES",
        help = "Cap on lines kept per file after compaction (none/whitespace levels).",
        help_heading = "Compaction"
    )]
    pub truncate_lines: Option<usize>,

    #[arg(
        long,
        help = "Include the directory tree header [default: enabled].",
        overrides_with = "disable_tree",
        help_heading = "Header"
    )]
    pub enable_tree: bool,
    #[arg(
        long,
        help = "Omit the directory tree header.",
        overrides_with = "enable_tree",
        help_heading = "Header"
    )]
    pub disable_tree: bool,

    #[arg(
        long,
        value_name = "TEXT",
        help = "Description text written below the run header.",
        conflicts_with = "disable_description",
        help_heading = "Header"
    )]
    pub description: Option<String>,
    #[arg(
        long,
        help = "Omit the description block.",
        help_heading = "Header"
    )]
    pub disable_description: bool,

    #[arg(long = "ext", value_name = "EXT", action = clap::ArgAction::Append, help = "Replace the configured extensions; repeat for each (e.g. 'py' or '.py').", help_heading = "Content Filtering")]
    pub extensions: Vec<String>,
    #[arg(long = "exclude", value_name = "NAME", action = clap::ArgAction::Append, help = "Replace the configured exclude list; repeat for each name or stem.", help_heading = "Content Filtering")]
    pub exclude_files: Vec<String>,
    #[arg(long = "include", value_name = "NAME[|RANGE]", action = clap::ArgAction::Append, help = "Replace the configured include list; repeat for each, optionally with a line range ('a.md|1-40', 'a.md|40').", help_heading = "Content Filtering")]
    pub include_files: Vec<String>,
    #[arg(long = "print-only", value_name = "NAME[|RANGE]", action = clap::ArgAction::Append, help = "Replace the configured print-only list; emit only these names, in this order.", help_heading = "Content Filtering")]
    pub print_only: Vec<String>,
    #[arg(long = "ignore-dir", value_name = "DIR", action = clap::ArgAction::Append, help = "Replace the configured ignore dirs; repeat for each name or path.", help_heading = "Content Filtering")]
    pub ignore_dirs: Vec<String>,
}
