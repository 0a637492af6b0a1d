//! Layered, priority-ordered ignore engine.
//!
//! Five rule sources are combined, first-match-wins, in this order:
//! ExplicitExclude, ExplicitInclude, BuiltIn, Gitignore, Custom (which also
//! absorbs ToolIgnore patterns). See [`IgnoreEngine::classify`].
//!
//! Gitignore (and ToolIgnore) matching is file-contextual: a query for a
//! path is answered by walking from that path's directory up to the scan
//! root, compiling one matcher from every ignore file found along the way
//! (root-most first, so a deeper file's patterns are added last and win
//! ties, mirroring real gitignore precedence). Compiled matchers are cached
//! per context directory since the engine is only ever touched by the
//! single-threaded scanner that owns it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::Match;

use crate::constants::BUILT_IN_IGNORE_PATTERNS;
use crate::error::{Result, ShotgunError};

/// The tool-specific ignore file name consulted by the ToolIgnore layer.
pub const TOOL_IGNORE_FILE_NAME: &str = ".shotgunignore";

/// The *why* of an ignore decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum IgnoreReason {
    None,
    BuiltIn,
    Gitignore,
    Custom,
    Explicit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub keep: bool,
    pub reason: IgnoreReason,
}

impl Classification {
    fn kept() -> Self {
        Self { keep: true, reason: IgnoreReason::None }
    }
}

pub struct IgnoreEngine {
    root: PathBuf,
    built_in: Gitignore,
    respect_gitignore: bool,
    respect_tool_ignore: bool,
    gitignore_cache: RefCell<HashMap<PathBuf, Option<Gitignore>>>,
    tool_ignore_cache: RefCell<HashMap<PathBuf, Option<Gitignore>>>,
    custom_patterns: Vec<String>,
    custom_matcher: Option<Gitignore>,
    explicit_exclude_patterns: Vec<String>,
    explicit_exclude_matcher: Option<Gitignore>,
    explicit_include_patterns: Vec<String>,
    explicit_include_matcher: Option<Gitignore>,
}

impl IgnoreEngine {
    /// Build a new engine rooted at `root`. Fails only if `root` itself
    /// cannot be read — per §4.1, a missing nested ignore file is never a
    /// hard failure.
    pub fn new(root: impl AsRef<Path>, respect_gitignore: bool, respect_tool_ignore: bool) -> Result<Self> {
        let root = root.as_ref();
        std::fs::read_dir(root).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ShotgunError::NotFound(root.to_path_buf())
            } else {
                ShotgunError::Io(e)
            }
        })?;

        let mut built_in_builder = GitignoreBuilder::new(root);
        for pattern in BUILT_IN_IGNORE_PATTERNS {
            // A hard-coded pattern table is assumed well-formed; a syntax
            // error here is a programming bug, not a runtime condition.
            built_in_builder
                .add_line(None, pattern)
                .expect("built-in ignore pattern must be valid glob syntax");
        }
        let built_in = built_in_builder.build().map_err(|e| {
            ShotgunError::InvalidConfig(format!("failed to compile built-in ignore patterns: {e}"))
        })?;

        Ok(Self {
            root: root.to_path_buf(),
            built_in,
            respect_gitignore,
            respect_tool_ignore,
            gitignore_cache: RefCell::new(HashMap::new()),
            tool_ignore_cache: RefCell::new(HashMap::new()),
            custom_patterns: Vec::new(),
            custom_matcher: None,
            explicit_exclude_patterns: Vec::new(),
            explicit_exclude_matcher: None,
            explicit_include_patterns: Vec::new(),
            explicit_include_matcher: None,
        })
    }

    /// Accumulate one Custom pattern and recompile the Custom matcher.
    pub fn add_custom_pattern(&mut self, pattern: impl Into<String>) {
        self.custom_patterns.push(pattern.into());
        self.recompile_custom();
    }

    /// Accumulate many Custom patterns at once.
    pub fn add_custom_patterns<I, S>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.custom_patterns.extend(patterns.into_iter().map(Into::into));
        self.recompile_custom();
    }

    pub fn add_explicit_exclude(&mut self, pattern: impl Into<String>) {
        self.explicit_exclude_patterns.push(pattern.into());
        self.explicit_exclude_matcher = Some(Self::compile(&self.root, &self.explicit_exclude_patterns));
    }

    pub fn add_explicit_include(&mut self, pattern: impl Into<String>) {
        self.explicit_include_patterns.push(pattern.into());
        self.explicit_include_matcher = Some(Self::compile(&self.root, &self.explicit_include_patterns));
    }

    fn recompile_custom(&mut self) {
        self.custom_matcher = if self.custom_patterns.is_empty() {
            None
        } else {
            Some(Self::compile(&self.root, &self.custom_patterns))
        };
    }

    fn compile(root: &Path, patterns: &[String]) -> Gitignore {
        let mut builder = GitignoreBuilder::new(root);
        for pattern in patterns {
            // A malformed user pattern is simply inert rather than fatal;
            // that mirrors gitignore's own tolerance for odd lines.
            let _ = builder.add_line(None, pattern);
        }
        builder.build().unwrap_or_else(|_| Gitignore::empty())
    }

    /// Decide the classification of `abs_path` (absolute, must be under
    /// `root`). `is_dir` affects directory-only (`dir/`) pattern matching.
    pub fn classify(&self, abs_path: &Path, is_dir: bool) -> Classification {
        if let Some(matcher) = &self.explicit_exclude_matcher {
            if matcher.matched(abs_path, is_dir).is_ignore() {
                return Classification { keep: false, reason: IgnoreReason::Explicit };
            }
        }
        if let Some(matcher) = &self.explicit_include_matcher {
            if matcher.matched(abs_path, is_dir).is_ignore() {
                return Classification::kept();
            }
        }
        if self.built_in.matched(abs_path, is_dir).is_ignore() {
            return Classification { keep: false, reason: IgnoreReason::BuiltIn };
        }
        if self.respect_gitignore {
            if let Some(matcher) = self.gitignore_matcher_for(abs_path) {
                if matcher.matched_path_or_any_parents(abs_path, is_dir).is_ignore() {
                    return Classification { keep: false, reason: IgnoreReason::Gitignore };
                }
            }
        }
        if let Some(matcher) = &self.custom_matcher {
            if matcher.matched(abs_path, is_dir).is_ignore() {
                return Classification { keep: false, reason: IgnoreReason::Custom };
            }
        }
        if self.respect_tool_ignore {
            if let Some(matcher) = self.tool_ignore_matcher_for(abs_path) {
                if matcher.matched_path_or_any_parents(abs_path, is_dir).is_ignore() {
                    return Classification { keep: false, reason: IgnoreReason::Custom };
                }
            }
        }
        Classification::kept()
    }

    fn gitignore_matcher_for(&self, path: &Path) -> Option<Gitignore> {
        let context_dir = path.parent().unwrap_or(&self.root).to_path_buf();
        Self::contextual_matcher(&self.root, &context_dir, ".gitignore", &self.gitignore_cache)
    }

    fn tool_ignore_matcher_for(&self, path: &Path) -> Option<Gitignore> {
        let context_dir = path.parent().unwrap_or(&self.root).to_path_buf();
        Self::contextual_matcher(&self.root, &context_dir, TOOL_IGNORE_FILE_NAME, &self.tool_ignore_cache)
    }

    /// Build (or fetch from cache) a matcher combining every `file_name`
    /// found from `root` down to `context_dir`, root-most first.
    fn contextual_matcher(
        root: &Path,
        context_dir: &Path,
        file_name: &str,
        cache: &RefCell<HashMap<PathBuf, Option<Gitignore>>>,
    ) -> Option<Gitignore> {
        if let Some(cached) = cache.borrow().get(context_dir) {
            return cached.clone();
        }

        let mut ancestors: Vec<PathBuf> = Vec::new();
        let mut current = Some(context_dir);
        while let Some(dir) = current {
            ancestors.push(dir.to_path_buf());
            if dir == root {
                break;
            }
            current = dir.parent();
        }
        ancestors.reverse(); // root-most first

        let mut builder = GitignoreBuilder::new(root);
        let mut found_any = false;
        for dir in &ancestors {
            let candidate = dir.join(file_name);
            if candidate.is_file() {
                // A broken/unreadable ignore file is skipped silently, per
                // the engine's "never fails on a nested ignore file" rule.
                if builder.add(&candidate).is_none() {
                    found_any = true;
                }
            }
        }

        let matcher = if found_any {
            builder.build().ok()
        } else {
            None
        };

        cache.borrow_mut().insert(context_dir.to_path_buf(), matcher.clone());
        matcher
    }
}

trait MatchExt {
    fn is_ignore(&self) -> bool;
}

impl<T> MatchExt for Match<T> {
    fn is_ignore(&self) -> bool {
        matches!(self, Match::Ignore(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn explicit_include_beats_gitignore() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".gitignore"), "*.secret\n").unwrap();
        fs::write(dir.path().join("a.secret"), "x").unwrap();

        let mut engine = IgnoreEngine::new(dir.path(), true, false).unwrap();
        let target = dir.path().join("a.secret");

        let before = engine.classify(&target, false);
        assert!(!before.keep);
        assert_eq!(before.reason, IgnoreReason::Gitignore);

        engine.add_explicit_include("a.secret");
        let after = engine.classify(&target, false);
        assert!(after.keep);
        assert_eq!(after.reason, IgnoreReason::None);
    }

    #[test]
    fn explicit_exclude_beats_explicit_include() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "x").unwrap();
        let mut engine = IgnoreEngine::new(dir.path(), true, false).unwrap();
        engine.add_explicit_include("a.txt");
        engine.add_explicit_exclude("a.txt");
        let c = engine.classify(&dir.path().join("a.txt"), false);
        assert!(!c.keep);
        assert_eq!(c.reason, IgnoreReason::Explicit);
    }

    #[test]
    fn nested_gitignore_reroots_at_containing_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".gitignore"), "*.tmp\n").unwrap();
        fs::create_dir_all(dir.path().join("sub/local")).unwrap();
        fs::write(dir.path().join("sub/.gitignore"), "local/\n").unwrap();
        fs::create_dir_all(dir.path().join("local")).unwrap();
        fs::write(dir.path().join("foo.tmp"), "x").unwrap();
        fs::write(dir.path().join("sub/local/x"), "x").unwrap();
        fs::write(dir.path().join("local/x"), "x").unwrap();

        let engine = IgnoreEngine::new(dir.path(), true, false).unwrap();

        let foo_tmp = engine.classify(&dir.path().join("foo.tmp"), false);
        assert!(!foo_tmp.keep);
        assert_eq!(foo_tmp.reason, IgnoreReason::Gitignore);

        let sub_local_x = engine.classify(&dir.path().join("sub/local/x"), false);
        assert!(!sub_local_x.keep);
        assert_eq!(sub_local_x.reason, IgnoreReason::Gitignore);

        let top_local_x = engine.classify(&dir.path().join("local/x"), false);
        assert!(top_local_x.keep);
    }

    #[test]
    fn built_in_ignores_vcs_directory() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        let engine = IgnoreEngine::new(dir.path(), true, false).unwrap();
        let c = engine.classify(&dir.path().join(".git"), true);
        assert!(!c.keep);
        assert_eq!(c.reason, IgnoreReason::BuiltIn);
    }

    #[test]
    fn custom_pattern_order_independence() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.log"), "x").unwrap();
        fs::write(dir.path().join("b.tmp"), "x").unwrap();

        let mut e1 = IgnoreEngine::new(dir.path(), false, false).unwrap();
        e1.add_custom_pattern("*.log");
        e1.add_custom_pattern("*.tmp");

        let mut e2 = IgnoreEngine::new(dir.path(), false, false).unwrap();
        e2.add_custom_patterns(["*.tmp", "*.log"]);

        for p in ["a.log", "b.tmp"] {
            let c1 = e1.classify(&dir.path().join(p), false);
            let c2 = e2.classify(&dir.path().join(p), false);
            assert_eq!(c1, c2);
            assert!(!c1.keep);
        }
    }

    #[test]
    fn tool_ignore_merges_into_custom_reason() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(TOOL_IGNORE_FILE_NAME), "secret.txt\n").unwrap();
        fs::write(dir.path().join("secret.txt"), "x").unwrap();
        let engine = IgnoreEngine::new(dir.path(), false, true).unwrap();
        let c = engine.classify(&dir.path().join("secret.txt"), false);
        assert!(!c.keep);
        assert_eq!(c.reason, IgnoreReason::Custom);
    }
}
