//! Streaming filesystem scanner: walks a root directory once and builds a
//! parent-linked [`FileTree`], applying the ignore engine and enforcing
//! size/count caps while it goes.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::cancel::CancellationToken;
use crate::error::{Result, ShotgunError};
use crate::ignore_engine::IgnoreEngine;
use crate::progress::{Progress, ProgressSink};

/// Immutable configuration for one scan.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Per-file byte cap; 0 means no limit.
    pub max_file_size: u64,
    /// Count cap on files only; 0 means no limit.
    pub max_files: usize,
    pub include_hidden: bool,
    pub include_ignored: bool,
    pub respect_gitignore: bool,
    pub respect_tool_ignore: bool,
    pub ignore_patterns: Vec<String>,
    /// Whitelist; empty means accept all files.
    pub include_patterns: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_file_size: 0,
            max_files: 0,
            include_hidden: false,
            include_ignored: false,
            respect_gitignore: true,
            respect_tool_ignore: true,
            ignore_patterns: Vec::new(),
            include_patterns: Vec::new(),
        }
    }
}

/// One node of the scanned tree. Stored in a flat arena; `parent_index` is
/// a non-owning relation into the same arena rather than a pointer, so the
/// tree carries no reference cycles.
#[derive(Debug, Clone)]
pub struct FileNode {
    pub name: String,
    pub absolute_path: PathBuf,
    /// Forward-slash normalized, relative to the tree root; `"."` for the
    /// root itself.
    pub relative_path: String,
    pub is_directory: bool,
    pub size: u64,
    /// Indices into the owning [`FileTree`]'s arena, directories-before-files
    /// then case-insensitive ascending. `Some` (possibly empty) iff
    /// `is_directory`.
    pub children: Option<Vec<usize>>,
    pub parent_index: Option<usize>,
    pub selected: bool,
    pub is_gitignored: bool,
    pub is_custom_ignored: bool,
    /// Matched an `ExplicitExclude` pattern. Kept as its own flag rather
    /// than folded into `is_custom_ignored` since `IgnoreReason::Explicit`
    /// means "always excluded", independent of `includeIgnored`.
    pub is_explicit_ignored: bool,
    /// UI hint only; the core never reads or writes it after construction.
    pub expanded: bool,
}

/// The scanned tree: a flat arena plus the index of the root node.
#[derive(Debug, Clone)]
pub struct FileTree {
    pub nodes: Vec<FileNode>,
    pub root_index: usize,
}

impl FileTree {
    pub fn root(&self) -> &FileNode {
        &self.nodes[self.root_index]
    }

    pub fn node(&self, index: usize) -> &FileNode {
        &self.nodes[index]
    }

    /// Total number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find_by_absolute_path(&self, path: &Path) -> Option<&FileNode> {
        self.nodes.iter().find(|n| n.absolute_path == path)
    }
}

pub struct Scanner;

impl Scanner {
    /// Synchronous scan with no progress reporting.
    pub fn scan(root: &Path, config: &ScanConfig) -> Result<FileTree> {
        Self::scan_with_progress(root, config, None, &CancellationToken::new())
    }

    /// Scan, emitting [`Progress`] events to `sink` (if present) every 100
    /// nodes, plus an initial and a final event. Never blocks on the sink.
    pub fn scan_with_progress(
        root: &Path,
        config: &ScanConfig,
        sink: Option<&dyn ProgressSink>,
        cancel: &CancellationToken,
    ) -> Result<FileTree> {
        let metadata = fs::metadata(root).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ShotgunError::NotFound(root.to_path_buf())
            } else {
                ShotgunError::Io(e)
            }
        })?;
        if !metadata.is_dir() {
            return Err(ShotgunError::NotADirectory(root.to_path_buf()));
        }

        let mut engine = IgnoreEngine::new(root, config.respect_gitignore, config.respect_tool_ignore)?;
        engine.add_custom_patterns(config.ignore_patterns.iter().cloned());

        let include_patterns: Vec<Pattern> = config
            .include_patterns
            .iter()
            .filter_map(|p| Pattern::new(p).ok())
            .collect();

        crate::progress::emit(sink, Progress::new(0, -1, "scanning", ""));

        let mut state = WalkState {
            engine: &engine,
            config,
            root,
            include_patterns: &include_patterns,
            arena: Vec::new(),
            file_count: 0,
            node_count: 0,
            visited_dirs: HashSet::new(),
            sink,
            cancel,
        };

        let root_index = state.build_node(root, None, ".".to_string())?;
        let tree = FileTree { nodes: state.arena, root_index };

        let total = tree.len() as i64;
        crate::progress::emit(sink, Progress::new(total, total, "complete", ""));

        Ok(tree)
    }
}

struct WalkState<'a> {
    engine: &'a IgnoreEngine,
    config: &'a ScanConfig,
    root: &'a Path,
    include_patterns: &'a [Pattern],
    arena: Vec<FileNode>,
    file_count: usize,
    node_count: usize,
    visited_dirs: HashSet<PathBuf>,
    sink: Option<&'a dyn ProgressSink>,
    cancel: &'a CancellationToken,
}

impl<'a> WalkState<'a> {
    /// Build the node for `path` (already known to be kept) and, if it is a
    /// directory, recursively build its children. Returns the node's arena
    /// index.
    fn build_node(&mut self, path: &Path, parent_index: Option<usize>, relative_path: String) -> Result<usize> {
        self.cancel.check()?;

        let metadata = fs::symlink_metadata(path)?;
        let is_dir = if metadata.is_symlink() {
            fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
        } else {
            metadata.is_dir()
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let classification = self.engine.classify(path, is_dir);
        let is_hidden = parent_index.is_some() && name.starts_with('.') && !self.config.include_hidden;

        let is_gitignored = classification.reason == crate::ignore_engine::IgnoreReason::Gitignore;
        let is_explicit_ignored = classification.reason == crate::ignore_engine::IgnoreReason::Explicit;
        let is_custom_ignored = is_hidden
            || matches!(
                classification.reason,
                crate::ignore_engine::IgnoreReason::Custom | crate::ignore_engine::IgnoreReason::BuiltIn
            );
        let ignored = !classification.keep || is_hidden;

        let index = self.arena.len();
        self.arena.push(FileNode {
            name,
            absolute_path: path.to_path_buf(),
            relative_path,
            is_directory: is_dir,
            size: 0,
            children: if is_dir { Some(Vec::new()) } else { None },
            parent_index,
            selected: false,
            is_gitignored,
            is_custom_ignored,
            is_explicit_ignored,
            expanded: false,
        });

        self.node_count += 1;
        if self.node_count % 100 == 0 {
            crate::progress::emit(
                self.sink,
                Progress::new(
                    self.node_count as i64,
                    -1,
                    "scanning",
                    format!("Processing: {}", self.arena[index].relative_path),
                ),
            );
        }

        if is_dir {
            if ignored && !self.config.include_ignored {
                // Prune: keep the node (caller attaches it) but don't descend.
                return Ok(index);
            }
            let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
            if !self.visited_dirs.insert(canonical) {
                return Ok(index); // symlink loop guard
            }
            self.populate_children(index, path)?;
        } else {
            if ignored && !self.config.include_ignored {
                return Ok(index);
            }
            let size = metadata.len();
            if self.config.max_file_size > 0 && size > self.config.max_file_size {
                // Caller drops this node entirely rather than counting it.
                self.arena[index].size = u64::MAX; // sentinel, filtered by caller
                return Ok(index);
            }
            if !self.include_patterns.is_empty() {
                let rel = &self.arena[index].relative_path;
                let base = &self.arena[index].name;
                if !self.include_patterns.iter().any(|p| p.matches(rel) || p.matches(base)) {
                    self.arena[index].size = u64::MAX;
                    return Ok(index);
                }
            }
            self.arena[index].size = size;
            self.file_count += 1;
        }

        Ok(index)
    }

    fn populate_children(&mut self, parent_index: usize, dir: &Path) -> Result<()> {
        self.cancel.check()?;

        let read_dir = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(_) => return Ok(()), // per-entry read errors prune silently
        };

        // Walk order is the spec order: depth-first, lexicographic per
        // directory, directories before files. Sorting here (rather than a
        // post-walk pass) means max_files and the "Processing: …" progress
        // messages both observe the same order the rendered tree will use.
        let mut entries: Vec<fs::DirEntry> = read_dir.flatten().collect();
        entries.sort_by(|a, b| {
            let a_is_dir = a.file_type().map(|t| t.is_dir()).unwrap_or(false);
            let b_is_dir = b.file_type().map(|t| t.is_dir()).unwrap_or(false);
            match (a_is_dir, b_is_dir) {
                (true, false) => std::cmp::Ordering::Less,
                (false, true) => std::cmp::Ordering::Greater,
                _ => a
                    .file_name()
                    .to_string_lossy()
                    .to_lowercase()
                    .cmp(&b.file_name().to_string_lossy().to_lowercase()),
            }
        });

        let mut child_indices = Vec::new();
        for entry in entries {
            self.cancel.check()?;

            if self.config.max_files > 0 && self.file_count >= self.config.max_files {
                break;
            }

            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            let rel = child_relative_path(&self.arena[parent_index].relative_path, &name);

            let child_index = match self.build_node(&path, Some(parent_index), rel) {
                Ok(idx) => idx,
                Err(ShotgunError::Cancelled) => return Err(ShotgunError::Cancelled),
                Err(_) => continue, // per-file stat errors skip silently
            };

            let dropped = self.arena[child_index].size == u64::MAX && !self.arena[child_index].is_directory;
            let pruned_ignored = {
                let node = &self.arena[child_index];
                !self.config.include_ignored
                    && (node.is_gitignored || node.is_custom_ignored || node.is_explicit_ignored)
            };

            if dropped || pruned_ignored {
                self.arena.truncate(child_index);
                continue;
            }

            child_indices.push(child_index);
        }

        self.arena[parent_index].children = Some(child_indices);
        Ok(())
    }
}

fn child_relative_path(parent_rel: &str, name: &str) -> String {
    if parent_rel == "." {
        name.replace('\\', "/")
    } else {
        format!("{parent_rel}/{}", name.replace('\\', "/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn sorts_directories_before_files_case_insensitive() {
        let dir = tempdir().unwrap();
        for name in ["zebra.txt", "apple.txt", "charlie.txt"] {
            write(dir.path(), name, "x");
        }
        fs::create_dir_all(dir.path().join("beta")).unwrap();
        fs::create_dir_all(dir.path().join("alpha")).unwrap();

        let tree = Scanner::scan(dir.path(), &ScanConfig::default()).unwrap();
        let root = tree.root();
        let names: Vec<&str> = root
            .children
            .as_ref()
            .unwrap()
            .iter()
            .map(|&i| tree.node(i).name.as_str())
            .collect();
        assert_eq!(names, vec!["alpha", "beta", "apple.txt", "charlie.txt", "zebra.txt"]);
    }

    #[test]
    fn hidden_file_policy() {
        let dir = tempdir().unwrap();
        write(dir.path(), ".env", "SECRET=1");

        let mut cfg = ScanConfig { include_hidden: false, ..Default::default() };
        let tree = Scanner::scan(dir.path(), &cfg).unwrap();
        assert!(tree.find_by_absolute_path(&dir.path().join(".env")).is_none());

        cfg.include_hidden = true;
        cfg.include_ignored = true;
        let tree = Scanner::scan(dir.path(), &cfg).unwrap();
        let node = tree.find_by_absolute_path(&dir.path().join(".env")).unwrap();
        assert!(!node.is_gitignored);
    }

    #[test]
    fn parent_links_and_relative_paths_are_consistent() {
        let dir = tempdir().unwrap();
        write(dir.path(), "sub/a.txt", "x");
        let tree = Scanner::scan(dir.path(), &ScanConfig::default()).unwrap();

        for (i, node) in tree.nodes.iter().enumerate() {
            if i == tree.root_index {
                assert_eq!(node.relative_path, ".");
                assert!(node.parent_index.is_none());
                continue;
            }
            let parent = tree.node(node.parent_index.unwrap());
            let expected = if parent.relative_path == "." {
                node.name.clone()
            } else {
                format!("{}/{}", parent.relative_path, node.name)
            };
            assert_eq!(node.relative_path, expected);
        }
    }

    #[test]
    fn max_file_size_skips_without_counting() {
        let dir = tempdir().unwrap();
        write(dir.path(), "big.txt", "0123456789");
        write(dir.path(), "small.txt", "x");

        let cfg = ScanConfig { max_file_size: 5, ..Default::default() };
        let tree = Scanner::scan(dir.path(), &cfg).unwrap();
        assert!(tree.find_by_absolute_path(&dir.path().join("big.txt")).is_none());
        assert!(tree.find_by_absolute_path(&dir.path().join("small.txt")).is_some());
    }

    #[test]
    fn not_a_directory_is_rejected() {
        let dir = tempdir().unwrap();
        write(dir.path(), "file.txt", "x");
        let err = Scanner::scan(&dir.path().join("file.txt"), &ScanConfig::default()).unwrap_err();
        assert!(matches!(err, ShotgunError::NotADirectory(_)));
    }

    #[test]
    fn explicit_exclude_stays_hidden_even_with_include_ignored() {
        let dir = tempdir().unwrap();
        write(dir.path(), "secret.txt", "x");

        let mut engine = crate::ignore_engine::IgnoreEngine::new(dir.path(), true, false).unwrap();
        engine.add_explicit_exclude("secret.txt");
        let config = ScanConfig { include_ignored: true, ..Default::default() };
        let include_patterns: Vec<Pattern> = Vec::new();

        let mut state = WalkState {
            engine: &engine,
            config: &config,
            root: dir.path(),
            include_patterns: &include_patterns,
            arena: Vec::new(),
            file_count: 0,
            node_count: 0,
            visited_dirs: HashSet::new(),
            sink: None,
            cancel: &CancellationToken::new(),
        };
        let root_index = state.build_node(dir.path(), None, ".".to_string()).unwrap();
        let tree = FileTree { nodes: state.arena, root_index };

        let node = tree.find_by_absolute_path(&dir.path().join("secret.txt")).unwrap();
        assert!(node.is_explicit_ignored);
        assert!(!node.is_gitignored);
        assert!(!node.is_custom_ignored);

        assert!(!crate::tree::render_tree(&tree).contains("secret.txt"));
    }
}
