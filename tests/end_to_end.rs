//! End-to-end scenarios exercising the ignore engine, scanner, and
//! generator together through the public API.

use std::collections::HashMap;
use std::path::PathBuf;

use shotgun_context::generator::{ContextGenerator, GenerateConfig};
use shotgun_context::ignore_engine::{IgnoreEngine, IgnoreReason};
use shotgun_context::scanner::{ScanConfig, Scanner};

fn write(dir: &std::path::Path, rel: &str, contents: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

#[test]
fn priority_explicit_include_beats_gitignore() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), ".gitignore", "*.secret\n");
    write(dir.path(), "a.secret", "top secret");

    let mut engine = IgnoreEngine::new(dir.path(), true, false).unwrap();
    engine.add_explicit_include("a.secret");

    let classification = engine.classify(&dir.path().join("a.secret"), false);
    assert!(classification.keep);
    assert_eq!(classification.reason, IgnoreReason::None);
}

#[test]
fn nested_gitignore_scenario() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), ".gitignore", "*.tmp\n");
    write(dir.path(), "sub/.gitignore", "local/\n");
    write(dir.path(), "foo.tmp", "x");
    write(dir.path(), "sub/local/x", "x");
    write(dir.path(), "local/x", "x");

    let engine = IgnoreEngine::new(dir.path(), true, false).unwrap();
    assert!(!engine.classify(&dir.path().join("foo.tmp"), false).keep);
    assert!(!engine.classify(&dir.path().join("sub/local/x"), false).keep);
    assert!(engine.classify(&dir.path().join("local/x"), false).keep);
}

#[test]
fn sort_scenario_directories_before_files_case_insensitive() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["zebra.txt", "apple.txt", "charlie.txt"] {
        write(dir.path(), name, "x");
    }
    std::fs::create_dir_all(dir.path().join("beta")).unwrap();
    std::fs::create_dir_all(dir.path().join("alpha")).unwrap();

    let tree = Scanner::scan(dir.path(), &ScanConfig::default()).unwrap();
    let names: Vec<&str> =
        tree.root().children.as_ref().unwrap().iter().map(|&i| tree.node(i).name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta", "apple.txt", "charlie.txt", "zebra.txt"]);
}

#[test]
fn hidden_file_policy_scenario() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), ".env", "SECRET=1");

    let tree = Scanner::scan(dir.path(), &ScanConfig { include_hidden: false, ..Default::default() }).unwrap();
    assert!(tree.find_by_absolute_path(&dir.path().join(".env")).is_none());

    let cfg = ScanConfig { include_hidden: true, include_ignored: true, ..Default::default() };
    let tree = Scanner::scan(dir.path(), &cfg).unwrap();
    let node = tree.find_by_absolute_path(&dir.path().join(".env")).unwrap();
    assert!(!node.is_gitignored);
}

#[test]
fn full_pipeline_renders_tree_and_file_contents() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/main.rs", "fn main() {}\n");
    write(dir.path(), "README.md", "hello\n");

    let mut vars = HashMap::new();
    vars.insert("TASK".to_string(), "Summarize this project".to_string());
    let cfg = GenerateConfig { root_path: dir.path().to_path_buf(), template_vars: vars, ..Default::default() };

    let result = ContextGenerator::generate(&cfg).unwrap();
    assert_eq!(result.file_count, 2);
    assert!(result.content.contains("Summarize this project"));
    assert!(result.content.contains("<file path=\"src/main.rs\">"));
    assert!(result.content.contains("fn main() {}"));
    assert!(result.content.contains("```rust"));
}

#[test]
fn cumulative_cap_fails_after_two_of_three_files() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["a.txt", "b.txt", "c.txt"] {
        write(dir.path(), name, "1234");
    }
    let mut vars = HashMap::new();
    vars.insert("TASK".to_string(), "x".to_string());
    let cfg = GenerateConfig {
        root_path: dir.path().to_path_buf(),
        template_vars: vars,
        max_total_size: 10,
        ..Default::default()
    };
    let err = ContextGenerator::generate(&cfg).unwrap_err();
    assert!(err.to_string().contains("content collection failed"));
}

#[test]
fn binary_skip_scenario() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bin.dat"), [0x00u8, 0x01, 0x02]).unwrap();
    write(dir.path(), "text.txt", "hello");

    let mut vars = HashMap::new();
    vars.insert("TASK".to_string(), "x".to_string());
    let cfg = GenerateConfig { root_path: dir.path().to_path_buf(), template_vars: vars, ..Default::default() };
    let result = ContextGenerator::generate(&cfg).unwrap();
    assert!(!result.content.contains("bin.dat"));
    assert!(result.content.contains("text.txt"));
}

#[allow(unused)]
fn unused_path_reference(_p: PathBuf) {}
