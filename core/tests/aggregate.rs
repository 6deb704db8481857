use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use xaggregate_core::{Aggregator, CompactionLevel, Config, ResolvedConfig};

fn project() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().canonicalize().unwrap();
    (tmp, root)
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn aggregator(root: &Path, edit: impl FnOnce(&mut Config)) -> Aggregator {
    let mut config = Config::default();
    edit(&mut config);
    Aggregator::new(ResolvedConfig::resolve(&config, root))
}

fn python_module() -> String {
    let mut src = String::from("# helpers for the demo\nimport os\n\n\ndef compute(values):\n");
    for i in 0..24 {
        src.push_str(&format!("    total_{i} = sum(values) + {i}  # step {i}\n"));
    }
    src.push_str("    return total_0\n");
    src
}

#[test]
fn stubs_elide_python_function_bodies() {
    let (_tmp, root) = project();
    let source = python_module();
    assert_eq!(source.lines().count(), 30);
    write(&root, "a.py", &source);

    let agg = aggregator(&root, |c| {
        c.compaction.level = CompactionLevel::Stubs;
        c.header.include_dirtree = false;
        c.split.split_at = 0;
    });
    let text = agg.assemble().unwrap().text();

    assert!(text.contains("[-] This file: a.py | Contents:\n"));
    assert!(text.contains("def compute(values):\n    ... # Body omitted"));
    assert!(!text.contains("total_"));
    assert!(!text.contains("helpers for the demo"));
}

#[test]
fn include_range_bypasses_extension_filter() {
    let (_tmp, root) = project();
    write(&root, "main.py", "print('hi')\n");
    let notes: String = (1..=12).map(|i| format!("note {i}\n")).collect();
    write(&root, "docs/notes.md", &notes);

    let agg = aggregator(&root, |c| {
        c.compaction.level = CompactionLevel::None;
        c.compaction.comments = true;
        c.filters.extensions = vec![".py".into()];
        c.filters.include_files = vec!["notes.md|1-5".into()];
        c.header.include_dirtree = false;
    });
    let assembled = agg.assemble().unwrap();
    let text = assembled.text();

    assert_eq!(assembled.files.len(), 2);
    let marker = format!(
        "[-] This file: {} (lines 1-5) | Contents:\n",
        Path::new("docs").join("notes.md").display()
    );
    let start = text.find(&marker).expect("notes block present") + marker.len();
    let body: Vec<&str> = text[start..].lines().take(6).collect();
    assert_eq!(
        body,
        vec![
            "note 1",
            "note 2",
            "note 3",
            "note 4",
            "note 5",
            "... (remaining 7 lines omitted)"
        ]
    );
}

#[test]
fn split_output_writes_numbered_chunks() {
    let (_tmp, root) = project();
    for name in ["a", "b", "c", "d", "e"] {
        let body: String = (0..30).map(|i| format!("{name}_{i} = {i}\n")).collect();
        write(&root, &format!("{name}.py"), &body);
    }

    let agg = aggregator(&root, |c| {
        c.general.output_filename = "out/bundle".into();
        c.split.split_at = 80;
        c.header.description = "Demo project".into();
    });
    let report = agg.aggregate().unwrap();

    assert!(report.written.len() > 1);
    for (i, chunk) in report.written.iter().enumerate() {
        assert_eq!(chunk.path, root.join(format!("out/bundle_{}.txt", i + 1)));
        assert!(chunk.path.is_file());
        assert_eq!(chunk.chunk_info.as_ref().unwrap().total_parts, report.written.len());
    }

    let combined: String = report
        .written
        .iter()
        .map(|c| fs::read_to_string(&c.path).unwrap())
        .collect();
    assert!(combined.starts_with("Aggregated on: "));
    assert!(combined.contains("Description:\nDemo project\n"));
    assert!(combined.contains("Project Directory Tree:\n"));
    for name in ["a", "b", "c", "d", "e"] {
        assert_eq!(combined.matches(&format!("This file: {name}.py |")).count(), 1);
    }
}

#[test]
fn single_output_and_reruns_skip_own_artifacts() {
    let (_tmp, root) = project();
    write(&root, "lib.rs", "// docs\npub fn f() {}\n");

    let agg = aggregator(&root, |c| {
        c.general.output_filename = "bundle.txt".into();
        c.split.split_at = 0;
    });
    let first = agg.aggregate().unwrap();
    assert_eq!(first.written.len(), 1);
    assert_eq!(first.written[0].path, root.join("bundle.txt"));
    assert!(first.written[0].chunk_info.is_none());

    let second = agg.aggregate().unwrap();
    assert_eq!(second.files_included, 1);
    let text = fs::read_to_string(root.join("bundle.txt")).unwrap();
    assert!(text.contains("[-] This file: lib.rs | Contents:\npub fn f() {}\n"));
    assert!(!text.contains("This file: bundle.txt"));
}

#[test]
fn print_only_ignores_other_filters() {
    let (_tmp, root) = project();
    write(&root, "src/app.js", "const a = 1;\n");
    write(&root, "README.md", "readme\n");
    write(&root, "node_modules/lib/app.js", "vendored\n");

    let agg = aggregator(&root, |c| {
        c.filters.extensions = vec![".py".into()];
        c.filters.exclude_files = vec!["readme".into()];
        c.filters.print_only = vec!["README.md".into(), "app.js".into()];
        c.filters.ignore_dirs = vec!["node_modules".into()];
        c.header.include_dirtree = false;
    });
    let assembled = agg.assemble().unwrap();
    let order: Vec<String> = assembled
        .files
        .iter()
        .map(|f| f.entry.relative_path.to_string_lossy().replace('\\', "/"))
        .collect();
    assert_eq!(order, vec!["README.md", "src/app.js"]);
    assert!(!assembled.text().contains("vendored"));
}

#[cfg(unix)]
#[test]
fn unreadable_file_gets_error_block_and_run_continues() {
    use std::os::unix::fs::PermissionsExt;

    let (_tmp, root) = project();
    write(&root, "a.py", "x = 1\n");
    write(&root, "b.py", "secret = 2\n");
    write(&root, "c.py", "z = 3\n");
    let locked = root.join("b.py");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read(&locked).is_ok() {
        // Privileged users can still read the file.
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
        return;
    }

    let agg = aggregator(&root, |c| {
        c.header.include_dirtree = false;
        c.split.split_at = 0;
    });
    let result = agg.assemble();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
    let assembled = result.unwrap();
    let text = assembled.text();

    assert_eq!(assembled.files.len(), 3);
    assert_eq!(assembled.read_errors, 1);
    assert!(text.contains("[-] This file: b.py | Contents:\nError reading file: "));
    assert!(text.contains("[-] This file: a.py | Contents:\nx = 1"));
    assert!(text.contains("[-] This file: c.py | Contents:\nz = 3"));
    assert!(!text.contains("secret = 2"));
}
