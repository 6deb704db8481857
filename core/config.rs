use crate::entry::{EntrySpec, LineRange};
use crate::error::{AppError, Result};
use indexmap::IndexMap;
use log;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_CONFIG_DIR: &str = ".xtools/xaggregate";
pub const DEFAULT_CONFIG_FILENAME: &str = "xaggregate.toml";
pub const DEFAULT_OUTPUT_FILENAME: &str = "project_directory_full_code.txt";
pub const DEFAULT_OUTPUT_EXTENSION: &str = ".txt";
pub const DEFAULT_SPLIT_AT: usize = 8400;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub compaction: CompactionConfig,
    #[serde(default)]
    pub header: HeaderConfig,
    #[serde(default)]
    pub filters: FiltersConfig,
    #[serde(default)]
    pub split: SplitConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    #[serde(default = "default_output_filename")]
    pub output_filename: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CompactionConfig {
    #[serde(default)]
    pub level: CompactionLevel,
    /// Keep comments in the emitted content.
    #[serde(default = "default_false")]
    pub comments: bool,
    #[serde(default)]
    pub max_lines_per_file: usize,
    #[serde(default)]
    pub truncate_lines: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HeaderConfig {
    #[serde(default = "default_true")]
    pub include_dirtree: bool,
    #[serde(default = "default_true")]
    pub include_description: bool,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct FiltersConfig {
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub exclude_files: Vec<String>,
    #[serde(default)]
    pub include_files: Vec<String>,
    #[serde(default)]
    pub print_only: Vec<String>,
    #[serde(default)]
    pub ignore_dirs: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SplitConfig {
    /// Line budget per output chunk; 0 disables splitting.
    #[serde(default = "default_split_at")]
    pub split_at: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CompactionLevel {
    None,
    #[default]
    Whitespace,
    Stubs,
}

impl fmt::Display for CompactionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompactionLevel::None => "none",
            CompactionLevel::Whitespace => "whitespace",
            CompactionLevel::Stubs => "stubs",
        };
        f.write_str(s)
    }
}

impl FromStr for CompactionLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(CompactionLevel::None),
            "whitespace" => Ok(CompactionLevel::Whitespace),
            "stubs" => Ok(CompactionLevel::Stubs),
            other => Err(AppError::InvalidArgument(format!(
                "Unknown compaction level '{}'. Use none, whitespace or stubs.",
                other
            ))),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_output_filename() -> String {
    DEFAULT_OUTPUT_FILENAME.to_string()
}
fn default_split_at() -> usize {
    DEFAULT_SPLIT_AT
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_filename: default_output_filename(),
        }
    }
}
impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            level: CompactionLevel::default(),
            comments: default_false(),
            max_lines_per_file: 0,
            truncate_lines: 0,
        }
    }
}
impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            include_dirtree: default_true(),
            include_description: default_true(),
            description: String::new(),
        }
    }
}
impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            split_at: default_split_at(),
        }
    }
}

impl Config {
    pub fn determine_project_root(cli_project_root: Option<&PathBuf>) -> Result<PathBuf> {
        let path_to_resolve = match cli_project_root {
            Some(p) => PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).as_ref()),
            None => env::current_dir().map_err(AppError::Io)?,
        };

        path_to_resolve.canonicalize().map_err(|e| {
            AppError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to canonicalize project root '{}': {}",
                    path_to_resolve.display(),
                    e
                ),
            ))
        })
    }

    pub fn resolve_config_path(
        project_root: &Path,
        cli_config_file: Option<&String>,
        cli_disable_config: bool,
    ) -> Result<Option<PathBuf>> {
        if cli_disable_config {
            log::debug!("Config file loading disabled via CLI flag.");
            return Ok(None);
        }

        let path_to_check = match cli_config_file {
            Some(p_str) => {
                let expanded_path_cow = shellexpand::tilde(p_str);
                let mut path = PathBuf::from(expanded_path_cow.as_ref());
                let looks_like_path = path.is_absolute()
                    || path.components().count() > 1
                    || p_str.contains(['/', '\\']);

                if looks_like_path {
                    if !path.exists() && path.extension().is_none() {
                        path.set_extension("toml");
                    }
                    if !path.exists() {
                        return Err(AppError::Config(format!(
                            "Specified config file not found at path: {}",
                            path.display()
                        )));
                    }
                    log::debug!("Using specified config file path: {}", path.display());
                    Some(path)
                } else {
                    let filename = if path.extension().is_none_or(|e| e != "toml") {
                        format!("{}.toml", path.to_string_lossy())
                    } else {
                        path.to_string_lossy().to_string()
                    };
                    let full_path = project_root.join(DEFAULT_CONFIG_DIR).join(filename);
                    if !full_path.exists() {
                        return Err(AppError::Config(format!(
                            "Specified config file '{}' not found in default directory: {}",
                            path.display(),
                            project_root.join(DEFAULT_CONFIG_DIR).display()
                        )));
                    }
                    log::debug!(
                        "Using specified config filename in default directory: {}",
                        full_path.display()
                    );
                    Some(full_path)
                }
            }
            None => {
                let default_path = project_root
                    .join(DEFAULT_CONFIG_DIR)
                    .join(DEFAULT_CONFIG_FILENAME);
                if default_path.exists() {
                    log::debug!("Using default config file path: {}", default_path.display());
                    Some(default_path)
                } else {
                    log::debug!(
                        "No config file specified and default not found at: {}",
                        default_path.display()
                    );
                    None
                }
            }
        };
        Ok(path_to_check)
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        log::info!("Loading configuration from: {}", config_path.display());
        let toml_content = fs::read_to_string(config_path).map_err(|e| AppError::FileRead {
            path: config_path.to_path_buf(),
            source: e,
        })?;
        toml::from_str::<Config>(&toml_content).map_err(|e| {
            AppError::TomlParse(format!(
                "Error parsing config file '{}': {}. Check TOML syntax and structure.",
                config_path.display(),
                e
            ))
        })
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Output base path and extension, e.g. `("out/code", ".txt")`.
    pub fn output_base_and_extension(&self) -> (PathBuf, String) {
        let output = PathBuf::from(&self.general.output_filename);
        match output.extension() {
            Some(ext) if !ext.is_empty() => {
                let ext = format!(".{}", ext.to_string_lossy());
                (output.with_extension(""), ext)
            }
            _ => (output, DEFAULT_OUTPUT_EXTENSION.to_string()),
        }
    }
}

/// The immutable, normalized view of a [`Config`] used for a single run.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    pub root: PathBuf,
    pub output_base: PathBuf,
    pub output_extension: String,
    pub compaction_level: CompactionLevel,
    pub keep_comments: bool,
    pub include_dirtree: bool,
    pub description: Option<String>,
    pub extensions: HashSet<String>,
    pub exclude_files: HashSet<String>,
    /// Lowercased include name -> spec, in configuration order.
    pub include_files: IndexMap<String, EntrySpec>,
    pub print_only: Vec<EntrySpec>,
    pub ignore_dirs: Vec<String>,
    pub split_at: usize,
    pub max_lines_per_file: Option<usize>,
    pub truncate_lines: Option<usize>,
    pub line_ranges: HashMap<String, LineRange>,
}

impl ResolvedConfig {
    pub fn resolve(config: &Config, project_root: &Path) -> Self {
        let (base, output_extension) = config.output_base_and_extension();
        let output_base = if base.is_absolute() {
            base
        } else {
            project_root.join(base)
        };

        let extensions: HashSet<String> = config
            .filters
            .extensions
            .iter()
            .map(|ext| ext.trim())
            .filter(|ext| !ext.is_empty())
            .map(|ext| {
                if ext.starts_with('.') {
                    ext.to_lowercase()
                } else {
                    format!(".{}", ext.to_lowercase())
                }
            })
            .collect();

        // Ranges on excludes are accepted for consistency but never used.
        let exclude_files: HashSet<String> = config
            .filters
            .exclude_files
            .iter()
            .map(|entry| EntrySpec::parse(entry).key())
            .collect();

        let mut line_ranges = HashMap::new();
        let mut include_files = IndexMap::new();
        for entry in &config.filters.include_files {
            let spec = EntrySpec::parse(entry);
            if let Some(range) = spec.range {
                line_ranges.insert(spec.key(), range);
            }
            include_files.insert(spec.key(), spec);
        }

        let mut print_only = Vec::new();
        for entry in &config.filters.print_only {
            let spec = EntrySpec::parse(entry);
            if let Some(range) = spec.range {
                line_ranges.insert(spec.key(), range);
            }
            print_only.push(spec);
        }

        let description = if config.header.include_description
            && !config.header.description.is_empty()
        {
            Some(config.header.description.clone())
        } else {
            None
        };

        let resolved = Self {
            root: project_root.to_path_buf(),
            output_base,
            output_extension,
            compaction_level: config.compaction.level,
            keep_comments: config.compaction.comments,
            include_dirtree: config.header.include_dirtree,
            description,
            extensions,
            exclude_files,
            include_files,
            print_only,
            ignore_dirs: config.filters.ignore_dirs.clone(),
            split_at: config.split.split_at,
            max_lines_per_file: Some(config.compaction.max_lines_per_file).filter(|n| *n > 0),
            truncate_lines: Some(config.compaction.truncate_lines).filter(|n| *n > 0),
            line_ranges,
        };

        log::info!(
            "Resolved configuration: compaction_level={}, include_dirtree={}, include_description={}, \
             extensions={}, split_at={}, max_lines_per_file={}, truncate_lines={}",
            resolved.compaction_level,
            resolved.include_dirtree,
            resolved.description.is_some(),
            if resolved.extensions.is_empty() {
                "<ALL>".to_string()
            } else {
                format!("{:?}", resolved.extensions)
            },
            if resolved.split_at == 0 {
                "OFF".to_string()
            } else {
                resolved.split_at.to_string()
            },
            resolved
                .max_lines_per_file
                .map_or_else(|| "∞".to_string(), |n| n.to_string()),
            resolved
                .truncate_lines
                .map_or_else(|| "OFF".to_string(), |n| n.to_string()),
        );
        resolved
    }

    pub fn line_range_for(&self, filename: &str) -> Option<LineRange> {
        self.line_ranges.get(&filename.to_lowercase()).copied()
    }

    pub fn is_print_only(&self) -> bool {
        !self.print_only.is_empty()
    }

    pub fn output_path(&self) -> PathBuf {
        with_suffix(&self.output_base, &self.output_extension)
    }

    pub fn chunk_path(&self, index: usize) -> PathBuf {
        with_suffix(&self.output_base, &format!("_{}{}", index, self.output_extension))
    }
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut os = base.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.general.output_filename, DEFAULT_OUTPUT_FILENAME);
        assert_eq!(config.compaction.level, CompactionLevel::Whitespace);
        assert!(!config.compaction.comments);
        assert!(config.header.include_dirtree);
        assert_eq!(config.split.split_at, DEFAULT_SPLIT_AT);
    }

    #[test]
    fn parses_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [compaction]
            level = "stubs"
            truncate_lines = 650

            [filters]
            extensions = ["py", ".JS"]
            include_files = ["notes.md|1-5"]
            "#,
        )
        .unwrap();
        assert_eq!(config.compaction.level, CompactionLevel::Stubs);
        assert_eq!(config.compaction.truncate_lines, 650);
        assert_eq!(config.split.split_at, DEFAULT_SPLIT_AT);
        assert_eq!(config.filters.include_files, vec!["notes.md|1-5"]);
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(toml::from_str::<Config>("[general]\nbogus = 1\n").is_err());
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let text = Config::default().to_toml_string().unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn output_name_without_extension_gets_txt() {
        let mut config = Config::default();
        config.general.output_filename = "bundle".to_string();
        assert_eq!(
            config.output_base_and_extension(),
            (PathBuf::from("bundle"), ".txt".to_string())
        );
        config.general.output_filename = "out/code.md".to_string();
        assert_eq!(
            config.output_base_and_extension(),
            (PathBuf::from("out/code"), ".md".to_string())
        );
    }

    #[test]
    fn resolve_normalizes_filters_and_ranges() {
        let mut config = Config::default();
        config.filters.extensions = vec!["PY".into(), ".js".into(), " ".into()];
        config.filters.exclude_files = vec!["Secrets".into(), "big.json|1-3".into()];
        config.filters.include_files = vec!["Notes.md|1-5".into(), "setup.cfg".into()];
        config.compaction.max_lines_per_file = 0;
        config.compaction.truncate_lines = 10;

        let resolved = ResolvedConfig::resolve(&config, Path::new("/proj"));
        assert!(resolved.extensions.contains(".py"));
        assert!(resolved.extensions.contains(".js"));
        assert_eq!(resolved.extensions.len(), 2);
        assert!(resolved.exclude_files.contains("secrets"));
        assert!(resolved.exclude_files.contains("big.json"));
        assert_eq!(
            resolved.include_files.keys().collect::<Vec<_>>(),
            vec!["notes.md", "setup.cfg"]
        );
        assert_eq!(resolved.line_range_for("NOTES.MD"), LineRange::new(1, 5));
        assert_eq!(resolved.line_range_for("big.json"), None);
        assert_eq!(resolved.max_lines_per_file, None);
        assert_eq!(resolved.truncate_lines, Some(10));
        assert_eq!(
            resolved.output_path(),
            PathBuf::from("/proj/project_directory_full_code.txt")
        );
        assert_eq!(
            resolved.chunk_path(3),
            PathBuf::from("/proj/project_directory_full_code_3.txt")
        );
    }

    #[test]
    fn empty_description_is_dropped() {
        let mut config = Config::default();
        let resolved = ResolvedConfig::resolve(&config, Path::new("/proj"));
        assert_eq!(resolved.description, None);

        config.header.description = "About this repo".into();
        let resolved = ResolvedConfig::resolve(&config, Path::new("/proj"));
        assert_eq!(resolved.description.as_deref(), Some("About this repo"));

        config.header.include_description = false;
        let resolved = ResolvedConfig::resolve(&config, Path::new("/proj"));
        assert_eq!(resolved.description, None);
    }

    #[test]
    fn compaction_level_from_str() {
        assert_eq!("STUBS".parse::<CompactionLevel>().unwrap(), CompactionLevel::Stubs);
        assert!("fancy".parse::<CompactionLevel>().is_err());
    }
}
