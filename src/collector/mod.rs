//! Content collector: given a scanned tree and a selection map, reads file
//! bodies in tree-walk order, skipping binaries and enforcing the
//! per-file and cumulative size caps.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use crate::cancel::CancellationToken;
use crate::constants::{detect_language, BINARY_SNIFF_LEN};
use crate::error::{Result, ShotgunError};
use crate::scanner::{FileNode, FileTree};

/// A single collected file body.
#[derive(Debug, Clone)]
pub struct CollectedFile {
    pub path: PathBuf,
    pub rel_path: String,
    pub language: &'static str,
    pub content: String,
    pub size: u64,
}

pub struct ContentCollector;

#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub max_files: usize,
    pub max_file_size: u64,
    pub max_total_size: u64,
    pub skip_binary: bool,
    /// If set, exceeding `max_total_size` is a hard failure. If unset, the
    /// file that would push the running total over the cap is truncated to
    /// fit the remaining budget and collection stops there.
    pub enforce_limit: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            max_files: 0,
            max_file_size: 0,
            max_total_size: 0,
            skip_binary: false,
            enforce_limit: true,
        }
    }
}

impl ContentCollector {
    /// `selections` maps absolute file path to whether it should be
    /// collected. Returns records in tree-walk (stored child) order.
    pub fn collect(
        tree: &FileTree,
        selections: &HashMap<PathBuf, bool>,
        options: &CollectOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<CollectedFile>> {
        let mut out = Vec::new();
        let mut cumulative: u64 = 0;
        let mut stopped = false;
        Self::walk(tree, tree.root_index, selections, options, cancel, &mut out, &mut cumulative, &mut stopped)?;
        Ok(out)
    }

    #[allow(clippy::too_many_arguments)]
    fn walk(
        tree: &FileTree,
        index: usize,
        selections: &HashMap<PathBuf, bool>,
        options: &CollectOptions,
        cancel: &CancellationToken,
        out: &mut Vec<CollectedFile>,
        cumulative: &mut u64,
        stopped: &mut bool,
    ) -> Result<()> {
        if *stopped {
            return Ok(());
        }
        cancel.check()?;
        let node = tree.node(index);

        if node.is_directory {
            if node.is_gitignored || node.is_custom_ignored || node.is_explicit_ignored {
                return Ok(());
            }
            if let Some(children) = &node.children {
                for &child in children {
                    Self::walk(tree, child, selections, options, cancel, out, cumulative, stopped)?;
                }
            }
            return Ok(());
        }

        if node.is_gitignored || node.is_custom_ignored || node.is_explicit_ignored {
            return Ok(());
        }

        let selected = selections.get(&node.absolute_path).copied().unwrap_or(false);
        if !selected {
            return Ok(());
        }

        if options.max_files > 0 && out.len() >= options.max_files {
            return Err(ShotgunError::LimitExceeded(format!(
                "file count exceeded: more than {} files selected",
                options.max_files
            )));
        }

        if options.max_file_size > 0 && node.size > options.max_file_size {
            return Ok(());
        }

        cancel.check()?;

        if options.skip_binary && Self::looks_binary(node)? {
            return Ok(());
        }

        let content = std::fs::read_to_string(&node.absolute_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidData {
                // Not valid UTF-8 despite passing the binary sniff (rare:
                // invalid bytes past the sniffed prefix); treat like a
                // binary skip rather than a hard failure.
                ShotgunError::Io(e)
            } else {
                ShotgunError::Io(e)
            }
        })?;

        let new_total = *cumulative + content.len() as u64;
        if options.max_total_size > 0 && new_total > options.max_total_size {
            if options.enforce_limit {
                return Err(ShotgunError::LimitExceeded(format!(
                    "total size exceeded: {new_total} bytes over {} byte cap",
                    options.max_total_size
                )));
            }

            let remaining = options.max_total_size.saturating_sub(*cumulative) as usize;
            let truncated = crate::util::truncate_to_byte_limit(&content, remaining).to_string();
            *cumulative = options.max_total_size;
            *stopped = true;
            if !truncated.is_empty() {
                out.push(CollectedFile {
                    path: node.absolute_path.clone(),
                    rel_path: node.relative_path.clone(),
                    language: detect_language(&node.name),
                    size: truncated.len() as u64,
                    content: truncated,
                });
            }
            return Ok(());
        }
        *cumulative = new_total;

        out.push(CollectedFile {
            path: node.absolute_path.clone(),
            rel_path: node.relative_path.clone(),
            language: detect_language(&node.name),
            size: content.len() as u64,
            content,
        });

        Ok(())
    }

    /// Reads the first [`BINARY_SNIFF_LEN`] bytes; the file is binary if
    /// any byte is `0x00` or the sample is not valid UTF-8.
    fn looks_binary(node: &FileNode) -> Result<bool> {
        let mut file = File::open(&node.absolute_path)?;
        let mut buf = vec![0u8; BINARY_SNIFF_LEN];
        let n = file.read(&mut buf)?;
        buf.truncate(n);
        Ok(buf.contains(&0) || std::str::from_utf8(&buf).is_err())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{Scanner, ScanConfig};
    use tempfile::tempdir;

    fn select_all(tree: &FileTree) -> HashMap<PathBuf, bool> {
        tree.nodes
            .iter()
            .filter(|n| !n.is_directory)
            .map(|n| (n.absolute_path.clone(), true))
            .collect()
    }

    #[test]
    fn skips_binary_files() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("bin.dat"), [0x00u8, 0x01, 0x02]).unwrap();
        std::fs::write(dir.path().join("text.txt"), "hello").unwrap();

        let tree = Scanner::scan(dir.path(), &ScanConfig::default()).unwrap();
        let selections = select_all(&tree);
        let options = CollectOptions { skip_binary: true, ..Default::default() };
        let files = ContentCollector::collect(&tree, &selections, &options, &CancellationToken::new()).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].rel_path, "text.txt");
    }

    #[test]
    fn cumulative_cap_fails_after_partial_emission() {
        let dir = tempdir().unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            std::fs::write(dir.path().join(name), "1234").unwrap(); // 4 bytes each
        }

        let tree = Scanner::scan(dir.path(), &ScanConfig::default()).unwrap();
        let selections = select_all(&tree);
        let options = CollectOptions { max_total_size: 10, ..Default::default() };
        let err = ContentCollector::collect(&tree, &selections, &options, &CancellationToken::new()).unwrap_err();
        assert!(matches!(err, ShotgunError::LimitExceeded(_)));
    }

    #[test]
    fn cumulative_cap_truncates_instead_of_failing_when_not_enforced() {
        let dir = tempdir().unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            std::fs::write(dir.path().join(name), "1234").unwrap(); // 4 bytes each
        }

        let tree = Scanner::scan(dir.path(), &ScanConfig::default()).unwrap();
        let selections = select_all(&tree);
        let options = CollectOptions { max_total_size: 10, enforce_limit: false, ..Default::default() };
        let files = ContentCollector::collect(&tree, &selections, &options, &CancellationToken::new()).unwrap();

        let total: u64 = files.iter().map(|f| f.size).sum();
        assert!(total <= 10);
        assert!(files.len() < 3);
    }

    #[test]
    fn language_detection_by_extension_and_basename() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM scratch").unwrap();

        let tree = Scanner::scan(dir.path(), &ScanConfig::default()).unwrap();
        let selections = select_all(&tree);
        let options = CollectOptions::default();
        let files = ContentCollector::collect(&tree, &selections, &options, &CancellationToken::new()).unwrap();

        let rs = files.iter().find(|f| f.rel_path == "main.rs").unwrap();
        assert_eq!(rs.language, "rust");
        let docker = files.iter().find(|f| f.rel_path == "Dockerfile").unwrap();
        assert_eq!(docker.language, "dockerfile");
    }
}
