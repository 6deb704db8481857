use crate::error::{AppError, Result};
use crate::gather::IgnoreSet;
use log;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE_INDENT: &str = "│   ";
const SPACE_INDENT: &str = "    ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirTree {
    pub text: String,
    pub directories: usize,
    pub files: usize,
}

struct TreeRenderer<'a> {
    ignore_set: &'a IgnoreSet,
    exclude_files: &'a HashSet<String>,
    lines: Vec<String>,
    directories: usize,
    files: usize,
}

/// Renders an ASCII tree of `project_root`, directories first, then files,
/// each group ordered case-insensitively.
pub fn render_tree(
    project_root: &Path,
    ignore_set: &IgnoreSet,
    exclude_files: &HashSet<String>,
) -> Result<DirTree> {
    log::info!("Generating directory tree...");
    let root_name = project_root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| project_root.display().to_string());

    let mut renderer = TreeRenderer {
        ignore_set,
        exclude_files,
        lines: vec![format!("{}/", root_name)],
        directories: 0,
        files: 0,
    };
    renderer.recurse(project_root, "")?;
    renderer.lines.push(format!(
        "\n{} directories, {} files",
        renderer.directories, renderer.files
    ));

    Ok(DirTree {
        text: renderer.lines.join("\n"),
        directories: renderer.directories,
        files: renderer.files,
    })
}

impl TreeRenderer<'_> {
    fn recurse(&mut self, directory: &Path, prefix: &str) -> Result<()> {
        let read_dir = match fs::read_dir(directory) {
            Ok(rd) => rd,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                log::warn!("Permission denied: {}", directory.display());
                self.lines.push(format!("{}{}[Permission Denied]", prefix, LAST_BRANCH));
                return Ok(());
            }
            Err(e) => {
                return Err(AppError::FileRead {
                    path: directory.to_path_buf(),
                    source: e,
                });
            }
        };

        let mut items: Vec<(bool, String, PathBuf)> = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = dir_entry.map_err(|e| AppError::FileRead {
                path: directory.to_path_buf(),
                source: e,
            })?;
            let path = dir_entry.path();
            let name = dir_entry.file_name().to_string_lossy().into_owned();
            // Symlinked directories are listed as leaves, never descended.
            let is_dir = dir_entry.file_type().is_ok_and(|ft| ft.is_dir());
            let is_file = !is_dir;
            if self.ignore_set.is_hidden_in_tree(&path) {
                continue;
            }
            if is_file && self.is_excluded_file(&path) {
                continue;
            }
            items.push((is_file, name, path));
        }
        items.sort_by(|a, b| (a.0, a.1.to_lowercase()).cmp(&(b.0, b.1.to_lowercase())));

        let count = items.len();
        for (i, (is_file, name, path)) in items.into_iter().enumerate() {
            let is_last = i + 1 == count;
            let pointer = if is_last { LAST_BRANCH } else { BRANCH };
            self.lines.push(format!("{}{}{}", prefix, pointer, name));
            if !is_file {
                self.directories += 1;
                let extension = if is_last { SPACE_INDENT } else { PIPE_INDENT };
                self.recurse(&path, &format!("{}{}", prefix, extension))?;
            } else {
                self.files += 1;
            }
        }
        Ok(())
    }

    fn is_excluded_file(&self, path: &Path) -> bool {
        let name = path.file_name().map(|n| n.to_string_lossy().to_lowercase());
        let stem = path.file_stem().map(|s| s.to_string_lossy().to_lowercase());
        name.is_some_and(|n| self.exclude_files.contains(&n))
            || stem.is_some_and(|s| self.exclude_files.contains(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn renders_dirs_first_with_connectors_and_counts() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("proj");
        fs::create_dir_all(root.join("src/util")).unwrap();
        fs::create_dir_all(root.join("Docs")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("src/main.py"), "").unwrap();
        fs::write(root.join("src/util/helpers.py"), "").unwrap();
        fs::write(root.join("Docs/guide.md"), "").unwrap();
        fs::write(root.join("b.txt"), "").unwrap();
        fs::write(root.join("A.txt"), "").unwrap();
        fs::write(root.join("secret.env"), "").unwrap();

        let ignore_set = IgnoreSet::new(&root, &[".git".to_string()]);
        let excludes: HashSet<String> = ["secret".to_string()].into_iter().collect();
        let tree = render_tree(&root, &ignore_set, &excludes).unwrap();

        let expected = "\
proj/
├── Docs
│   └── guide.md
├── src
│   ├── util
│   │   └── helpers.py
│   └── main.py
├── A.txt
└── b.txt

3 directories, 5 files";
        assert_eq!(tree.text, expected);
        assert_eq!(tree.directories, 3);
        assert_eq!(tree.files, 5);
    }

    #[test]
    fn nested_dirs_with_an_ignored_name_are_hidden() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("proj");
        fs::create_dir_all(root.join("web/node_modules/pkg")).unwrap();
        fs::write(root.join("web/node_modules/pkg/index.js"), "").unwrap();
        fs::write(root.join("web/app.js"), "").unwrap();

        let ignore_set = IgnoreSet::new(&root, &["node_modules".to_string()]);
        let tree = render_tree(&root, &ignore_set, &HashSet::new()).unwrap();
        assert_eq!(tree.text, "proj/\n└── web\n    └── app.js\n\n1 directories, 1 files");
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_dirs_are_leaves() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("proj");
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("a/f.txt"), "").unwrap();
        std::os::unix::fs::symlink(&root, root.join("a/loop")).unwrap();

        let tree = render_tree(&root, &IgnoreSet::default(), &HashSet::new()).unwrap();
        assert_eq!(
            tree.text,
            "proj/\n└── a\n    ├── f.txt\n    └── loop\n\n1 directories, 2 files"
        );
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_dir_becomes_permission_denied_leaf() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("proj");
        let locked = root.join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("hidden.txt"), "").unwrap();
        fs::write(root.join("open.txt"), "").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // Privileged users can still list the directory.
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = render_tree(&root, &IgnoreSet::default(), &HashSet::new());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        let tree = result.unwrap();
        assert_eq!(
            tree.text,
            "proj/\n├── locked\n│   └── [Permission Denied]\n└── open.txt\n\n1 directories, 1 files"
        );
    }

    #[test]
    fn empty_directory_renders_zero_counts() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("empty");
        fs::create_dir_all(&root).unwrap();
        let tree = render_tree(&root, &IgnoreSet::default(), &HashSet::new()).unwrap();
        assert_eq!(tree.text, "empty/\n\n0 directories, 0 files");
    }
}
