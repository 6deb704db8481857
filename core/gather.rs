use crate::config::ResolvedConfig;
use crate::entry::EntrySpec;
use crate::error::{AppError, Result};
use globset::{GlobBuilder, GlobMatcher};
use ignore::WalkBuilder;
use log;
use serde::Serialize;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A candidate file with the lowercased name parts the selection policy needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub path: PathBuf,
    pub relative_path: PathBuf,
    pub name_lower: String,
    pub stem_lower: String,
    /// Lowercased extension including the leading dot, empty when absent.
    pub ext_lower: String,
}

impl FileEntry {
    pub fn new(path: PathBuf, project_root: &Path) -> Self {
        let relative_path = pathdiff::diff_paths(&path, project_root).unwrap_or_else(|| path.clone());
        let name_lower = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let stem_lower = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let ext_lower = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();
        Self {
            path,
            relative_path,
            name_lower,
            stem_lower,
            ext_lower,
        }
    }

    pub fn is_excluded(&self, exclude_files: &HashSet<String>) -> bool {
        exclude_files.contains(&self.name_lower) || exclude_files.contains(&self.stem_lower)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionOrigin {
    Walked,
    ForceIncluded,
    PrintOnly,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectedFile {
    pub entry: FileEntry,
    pub origin: SelectionOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Include,
    Excluded,
    FilteredByExtension,
}

/// Main-pass inclusion policy for one walked file.
pub fn decide(entry: &FileEntry, config: &ResolvedConfig) -> Decision {
    let is_explicitly_included = config.include_files.contains_key(&entry.name_lower);
    let is_excluded = entry.is_excluded(&config.exclude_files);

    let passes_extension_filter = config.extensions.is_empty()
        || config.extensions.contains(&entry.ext_lower)
        || is_explicitly_included;

    if is_excluded {
        Decision::Excluded
    } else if passes_extension_filter {
        Decision::Include
    } else {
        Decision::FilteredByExtension
    }
}

/// Ignored directories, resolved once per run.
///
/// The walk matches entries only by resolved-path prefix. Entries without a
/// path separator are also kept as bare names, which the tree renderer hides
/// at any depth.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    roots: Vec<PathBuf>,
    names: HashSet<String>,
}

impl IgnoreSet {
    pub fn new(project_root: &Path, ignore_dirs: &[String]) -> Self {
        let mut roots = Vec::new();
        let mut names = HashSet::new();
        for dir in ignore_dirs {
            let trimmed = dir.trim().trim_end_matches(['/', '\\']);
            if trimmed.is_empty() {
                continue;
            }
            if !trimmed.contains(['/', '\\']) {
                names.insert(trimmed.to_string());
            }
            let candidate = project_root.join(trimmed);
            match candidate.canonicalize() {
                Ok(resolved) => roots.push(resolved),
                Err(e) => log::debug!(
                    "Ignore dir '{}' could not be resolved ({}), skipping",
                    candidate.display(),
                    e
                ),
            }
        }
        Self { roots, names }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty() && self.names.is_empty()
    }

    /// True when `path` lies below a resolved ignored directory.
    pub fn is_ignored(&self, path: &Path) -> bool {
        if self.roots.is_empty() {
            return false;
        }
        match path.canonicalize() {
            Ok(resolved) => self
                .roots
                .iter()
                .any(|root| resolved != *root && resolved.starts_with(root)),
            Err(e) => {
                log::warn!("Resolve failed: {} due to {}", path.display(), e);
                false
            }
        }
    }

    /// True when `path` is itself one of the resolved ignored directories.
    pub fn is_ignored_root(&self, path: &Path) -> bool {
        !self.roots.is_empty()
            && path
                .canonicalize()
                .is_ok_and(|resolved| self.roots.contains(&resolved))
    }

    /// Tree visibility: hidden when the entry carries an ignored bare name
    /// or is an ignored directory.
    pub fn is_hidden_in_tree(&self, path: &Path) -> bool {
        path.file_name()
            .is_some_and(|n| self.names.contains(&*n.to_string_lossy()))
            || self.is_ignored_root(path)
    }
}

/// Recursively enumerates files under `project_root`, skipping ignored
/// directories, in full lexical path order.
pub fn walk_files(project_root: &Path, ignore_set: &IgnoreSet) -> Result<Vec<FileEntry>> {
    let mut builder = WalkBuilder::new(project_root);
    builder.standard_filters(false);
    builder.follow_links(false);
    let prune = ignore_set.clone();
    builder.filter_entry(move |entry| {
        let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
        !(entry.depth() > 0 && is_dir && prune.is_ignored_root(entry.path()))
    });

    log::info!("Walking project directory: {}", project_root.display());
    let mut paths = Vec::new();
    for entry_result in builder.build() {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(e) if is_permission_denied(e.io_error()) => {
                log::warn!("Error walking directory: {}", e);
                continue;
            }
            Err(e) => return Err(AppError::Ignore(e)),
        };
        if entry.depth() == 0 || !entry.path().is_file() {
            continue;
        }
        if ignore_set.is_ignored(entry.path()) {
            log::trace!("Skipping ignored path: {}", entry.path().display());
            continue;
        }
        paths.push(entry.into_path());
    }
    paths.sort();
    log::info!("Directory walk complete. Found {} files.", paths.len());

    Ok(paths
        .into_iter()
        .map(|path| FileEntry::new(path, project_root))
        .collect())
}

/// Unsorted walk used by the name searches; yields files in filesystem order.
fn walk_files_unsorted(project_root: &Path, ignore_set: &IgnoreSet) -> Result<Vec<PathBuf>> {
    let walker = WalkDir::new(project_root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !(e.depth() > 0 && e.file_type().is_dir() && ignore_set.is_ignored_root(e.path())));

    let mut paths = Vec::new();
    for entry_result in walker {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(e) if is_permission_denied(e.io_error()) => {
                log::warn!("Error walking directory: {}", e);
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if entry.depth() > 0 && entry.path().is_file() && !ignore_set.is_ignored(entry.path()) {
            paths.push(entry.into_path());
        }
    }
    Ok(paths)
}

fn is_permission_denied(err: Option<&io::Error>) -> bool {
    err.is_some_and(|e| e.kind() == io::ErrorKind::PermissionDenied)
}

fn name_matcher(name: &str) -> Result<GlobMatcher> {
    let pattern = format!("**/{}", name.trim_start_matches("./"));
    let glob = GlobBuilder::new(&pattern).literal_separator(true).build()?;
    Ok(glob.compile_matcher())
}

/// Files the run must never aggregate: the running executable and the
/// artifacts this run writes (or wrote on a previous run).
#[derive(Debug, Clone)]
pub struct OwnArtifacts {
    executable: Option<PathBuf>,
    output_dir: PathBuf,
    output_stem: String,
    output_extension: String,
}

impl OwnArtifacts {
    pub fn new(config: &ResolvedConfig) -> Self {
        let executable = std::env::current_exe()
            .ok()
            .and_then(|p| p.canonicalize().ok());
        let output_dir = config
            .output_base
            .parent()
            .map(|p| p.canonicalize().unwrap_or_else(|_| p.to_path_buf()))
            .unwrap_or_default();
        let output_stem = config
            .output_base
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            executable,
            output_dir,
            output_stem,
            output_extension: config.output_extension.clone(),
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if self.executable.as_ref() == Some(&resolved) {
            return true;
        }
        if resolved.parent() != Some(self.output_dir.as_path()) {
            return false;
        }
        let Some(name) = resolved.file_name().map(|n| n.to_string_lossy()) else {
            return false;
        };
        let Some(rest) = name
            .strip_prefix(self.output_stem.as_str())
            .and_then(|r| r.strip_suffix(self.output_extension.as_str()))
        else {
            return false;
        };
        rest.is_empty()
            || rest
                .strip_prefix('_')
                .is_some_and(|idx| !idx.is_empty() && idx.bytes().all(|b| b.is_ascii_digit()))
    }
}

/// Applies the selection policy and returns files in emission order.
pub fn gather_files(config: &ResolvedConfig) -> Result<Vec<SelectedFile>> {
    let ignore_set = IgnoreSet::new(&config.root, &config.ignore_dirs);
    let own = OwnArtifacts::new(config);

    if config.is_print_only() {
        return gather_print_only(config, &ignore_set, &own);
    }

    let mut selected = Vec::new();
    let mut processed_names = HashSet::<String>::new();
    let mut processed_paths = HashSet::<PathBuf>::new();

    for entry in walk_files(&config.root, &ignore_set)? {
        if own.contains(&entry.path) {
            log::debug!("Skipping own artifact: {}", entry.path.display());
            continue;
        }
        match decide(&entry, config) {
            Decision::Include => {
                if !processed_paths.insert(resolved_or_raw(&entry.path)) {
                    log::trace!("Skipping duplicate: {}", entry.path.display());
                    continue;
                }
                log::info!("Including file: {}", entry.relative_path.display());
                processed_names.insert(entry.name_lower.clone());
                selected.push(SelectedFile {
                    entry,
                    origin: SelectionOrigin::Walked,
                });
            }
            Decision::Excluded => {
                log::trace!("Excluded by name: {}", entry.relative_path.display());
            }
            Decision::FilteredByExtension => {
                log::trace!("Filtered by extension: {}", entry.relative_path.display());
            }
        }
    }

    let pending: Vec<&EntrySpec> = config
        .include_files
        .iter()
        .filter(|(key, _)| !processed_names.contains(*key))
        .map(|(_, spec)| spec)
        .collect();
    if pending.is_empty() {
        return Ok(selected);
    }

    log::debug!("Force-including {} unmatched include entries", pending.len());
    let all_files = walk_files_unsorted(&config.root, &ignore_set)?;
    for spec in pending {
        let key = spec.key();
        for path in &all_files {
            let entry = FileEntry::new(path.clone(), &config.root);
            if entry.name_lower != key || own.contains(path) {
                continue;
            }
            if entry.is_excluded(&config.exclude_files) {
                log::info!(
                    "Not force-including excluded file: {}",
                    entry.relative_path.display()
                );
                continue;
            }
            if !processed_paths.insert(resolved_or_raw(path)) {
                continue;
            }
            log::info!("Force-including file: {}", entry.relative_path.display());
            selected.push(SelectedFile {
                entry,
                origin: SelectionOrigin::ForceIncluded,
            });
        }
    }

    Ok(selected)
}

fn gather_print_only(
    config: &ResolvedConfig,
    ignore_set: &IgnoreSet,
    own: &OwnArtifacts,
) -> Result<Vec<SelectedFile>> {
    log::info!("print_only enabled.");
    let all_files = walk_files_unsorted(&config.root, ignore_set)?;
    let mut selected = Vec::new();

    for spec in &config.print_only {
        let matcher = match name_matcher(&spec.filename) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("Skipping print_only entry '{}': {}", spec.filename, e);
                continue;
            }
        };
        for path in &all_files {
            let entry = FileEntry::new(path.clone(), &config.root);
            if !matcher.is_match(&entry.relative_path) || own.contains(path) {
                continue;
            }
            log::info!("Printing file: {}", entry.relative_path.display());
            selected.push(SelectedFile {
                entry,
                origin: SelectionOrigin::PrintOnly,
            });
        }
    }
    Ok(selected)
}

fn resolved_or_raw(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn resolved(root: &Path, edit: impl FnOnce(&mut Config)) -> ResolvedConfig {
        let mut config = Config::default();
        edit(&mut config);
        ResolvedConfig::resolve(&config, root)
    }

    fn rels(files: &[SelectedFile]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.entry.relative_path.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn file_entry_derives_lowercased_parts() {
        let entry = FileEntry::new(PathBuf::from("/p/src/Main.PY"), Path::new("/p"));
        assert_eq!(entry.relative_path, PathBuf::from("src/Main.PY"));
        assert_eq!(entry.name_lower, "main.py");
        assert_eq!(entry.stem_lower, "main");
        assert_eq!(entry.ext_lower, ".py");

        let dotfile = FileEntry::new(PathBuf::from("/p/.bashrc"), Path::new("/p"));
        assert_eq!(dotfile.ext_lower, "");
        assert_eq!(dotfile.stem_lower, ".bashrc");
    }

    #[test]
    fn decide_applies_extension_include_and_exclude() {
        let config = resolved(Path::new("/p"), |c| {
            c.filters.extensions = vec!["py".into()];
            c.filters.include_files = vec!["README.md".into()];
            c.filters.exclude_files = vec!["secret".into(), "readme.md".into()];
        });
        let at = |p: &str| FileEntry::new(PathBuf::from(p), Path::new("/p"));

        assert_eq!(decide(&at("/p/a.py"), &config), Decision::Include);
        assert_eq!(decide(&at("/p/a.js"), &config), Decision::FilteredByExtension);
        assert_eq!(decide(&at("/p/secret.py"), &config), Decision::Excluded);
        assert_eq!(decide(&at("/p/README.md"), &config), Decision::Excluded);
    }

    #[test]
    fn empty_allow_set_includes_everything() {
        let config = resolved(Path::new("/p"), |_| {});
        let entry = FileEntry::new(PathBuf::from("/p/data.bin"), Path::new("/p"));
        assert_eq!(decide(&entry, &config), Decision::Include);
    }

    #[test]
    fn walk_is_sorted_and_skips_ignored_dirs() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        touch(&root, "b.py", "");
        touch(&root, "a/z.py", "");
        touch(&root, "a/b.py", "");
        touch(&root, "node_modules/x.js", "");
        touch(&root, "src/node_modules/y.js", "");
        touch(&root, "static/libs/big.js", "");
        touch(&root, "static/app.js", "");

        let ignore_set = IgnoreSet::new(
            &root,
            &["node_modules".to_string(), "static/libs".to_string()],
        );
        let files = walk_files(&root, &ignore_set).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|f| f.relative_path.to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(
            names,
            vec!["a/b.py", "a/z.py", "b.py", "src/node_modules/y.js", "static/app.js"]
        );
    }

    #[test]
    fn bare_names_hide_nested_dirs_only_in_the_tree() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        touch(&root, "pkg/libs/x.py", "");
        touch(&root, "libs/y.py", "");

        let ignore_set = IgnoreSet::new(&root, &["libs".to_string()]);
        assert!(ignore_set.is_ignored(&root.join("libs/y.py")));
        assert!(!ignore_set.is_ignored(&root.join("pkg/libs/x.py")));
        assert!(ignore_set.is_ignored_root(&root.join("libs")));
        assert!(!ignore_set.is_ignored_root(&root.join("pkg/libs")));
        assert!(ignore_set.is_hidden_in_tree(&root.join("pkg/libs")));
    }

    #[test]
    fn included_name_bypasses_extension_filter_but_not_exclude() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        touch(&root, "main.py", "print(1)\n");
        touch(&root, "docs/notes.md", "# notes\n");
        touch(&root, "docs/secret.md", "hidden\n");

        let config = resolved(&root, |c| {
            c.general.output_filename = "out/bundle.txt".into();
            c.filters.extensions = vec![".py".into()];
            c.filters.include_files = vec!["NOTES.md|1-5".into(), "secret.md".into()];
            c.filters.exclude_files = vec!["secret".into()];
        });
        let files = gather_files(&config).unwrap();
        // The main pass already admits included names at their sorted position,
        // and the second pass re-applies the same exclude check.
        assert_eq!(rels(&files), vec!["docs/notes.md", "main.py"]);
        assert!(files.iter().all(|f| f.origin == SelectionOrigin::Walked));
    }

    #[test]
    fn print_only_follows_list_order() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        touch(&root, "a.py", "");
        touch(&root, "pkg/z.js", "");
        touch(&root, "vendor/z.js", "");

        let config = resolved(&root, |c| {
            c.filters.print_only = vec!["z.js".into(), "a.py|3".into()];
            c.filters.ignore_dirs = vec!["vendor".into()];
        });
        let files = gather_files(&config).unwrap();
        assert_eq!(rels(&files), vec!["pkg/z.js", "a.py"]);
        assert!(files.iter().all(|f| f.origin == SelectionOrigin::PrintOnly));
    }

    #[test]
    fn previous_output_artifacts_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        touch(&root, "a.py", "");
        touch(&root, "bundle.txt", "old");
        touch(&root, "bundle_2.txt", "old");
        touch(&root, "bundle_notes.txt", "keep");

        let config = resolved(&root, |c| c.general.output_filename = "bundle.txt".into());
        let files = gather_files(&config).unwrap();
        assert_eq!(rels(&files), vec!["a.py", "bundle_notes.txt"]);
    }
}
