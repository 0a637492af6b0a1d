//! Context generator: the pipeline that turns a root directory and a
//! selection into a rendered context document, per the scan → tree →
//! collect → template stages.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::cancel::CancellationToken;
use crate::collector::{CollectOptions, CollectedFile, ContentCollector};
use crate::error::{Result, ShotgunError};
use crate::progress::{Progress, ProgressSink};
use crate::scanner::{ScanConfig, Scanner};
use crate::template::{TemplateContext, TemplateRenderer};
use crate::tree::render_tree;

const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_MAX_FILES: usize = 1000;

/// Input to one generation run. `selections` of `None` means "select every
/// file the scan keeps" — the common case for a CLI invocation with no
/// interactive picker.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub root_path: PathBuf,
    pub scan_config: ScanConfig,
    pub selections: Option<HashMap<PathBuf, bool>>,
    pub template_text: Option<String>,
    pub template_vars: HashMap<String, String>,
    pub max_file_size: u64,
    pub max_total_size: u64,
    pub max_files: usize,
    pub skip_binary: bool,
    pub output_path: Option<PathBuf>,
    /// If set (the default), content above `max_total_size` is a hard
    /// failure. If unset, it is truncated to fit instead.
    pub enforce_limit: bool,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            root_path: PathBuf::new(),
            scan_config: ScanConfig::default(),
            selections: None,
            template_text: None,
            template_vars: HashMap::new(),
            max_file_size: 0,
            max_total_size: 0,
            max_files: 0,
            skip_binary: true,
            output_path: None,
            enforce_limit: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerateResult {
    pub content: String,
    pub output_path: Option<PathBuf>,
    pub file_count: usize,
    pub content_size: u64,
    pub token_estimate: u64,
}

pub struct ContextGenerator;

impl ContextGenerator {
    pub fn generate(cfg: &GenerateConfig) -> Result<GenerateResult> {
        Self::generate_with_progress(cfg, None, &CancellationToken::new())
    }

    pub fn generate_with_progress(
        cfg: &GenerateConfig,
        sink: Option<&dyn ProgressSink>,
        cancel: &CancellationToken,
    ) -> Result<GenerateResult> {
        let max_file_size = if cfg.max_file_size == 0 { DEFAULT_MAX_SIZE } else { cfg.max_file_size };
        let max_total_size = if cfg.max_total_size == 0 { DEFAULT_MAX_SIZE } else { cfg.max_total_size };
        let max_files = if cfg.max_files == 0 { DEFAULT_MAX_FILES } else { cfg.max_files };

        let tree = Scanner::scan_with_progress(&cfg.root_path, &cfg.scan_config, sink, cancel)
            .map_err(|e| e.with_stage("scan"))?;

        crate::progress::emit(sink, Progress::new(-1, -1, "tree_generation", ""));
        let ascii_tree = render_tree(&tree);

        crate::progress::emit(sink, Progress::new(-1, -1, "content_collection", ""));
        let selections = cfg.selections.clone().unwrap_or_else(|| default_selections(&tree));
        let collect_options = CollectOptions {
            max_files,
            max_file_size,
            max_total_size,
            skip_binary: cfg.skip_binary,
            enforce_limit: cfg.enforce_limit,
        };
        let files = ContentCollector::collect(&tree, &selections, &collect_options, cancel)
            .map_err(|e| e.with_stage("content collection"))?;

        let file_structure = build_file_structure(&ascii_tree, &files);

        crate::progress::emit(sink, Progress::new(-1, -1, "template_rendering", ""));
        let template_ctx = TemplateContext {
            file_structure,
            files: &files,
            current_date: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            max_total_size_bytes: max_total_size,
            template_vars: &cfg.template_vars,
        };
        let mut content = TemplateRenderer::render(cfg.template_text.as_deref(), &template_ctx)
            .map_err(|e| e.with_stage("template rendering"))?;

        if content.len() as u64 > max_total_size {
            if cfg.enforce_limit {
                return Err(ShotgunError::LimitExceeded(format!(
                    "rendered content is {} bytes, over the {max_total_size} byte cap",
                    content.len()
                ))
                .with_stage("template rendering"));
            }
            content = crate::util::truncate_to_byte_limit(&content, max_total_size as usize).to_string();
        }
        let content_size = content.len() as u64;

        crate::progress::emit(sink, Progress::new(1, 1, "complete", ""));

        Ok(GenerateResult {
            token_estimate: estimate_tokens(&content),
            content,
            output_path: cfg.output_path.clone(),
            file_count: files.len(),
            content_size,
        })
    }
}

fn default_selections(tree: &crate::scanner::FileTree) -> HashMap<PathBuf, bool> {
    tree.nodes
        .iter()
        .filter(|n| !n.is_directory && !n.is_gitignored && !n.is_custom_ignored && !n.is_explicit_ignored)
        .map(|n| (n.absolute_path.clone(), true))
        .collect()
}

/// ASCII tree, a blank line, then one `<file path="…">…</file>` block per
/// collected file with exactly one trailing newline before the closing tag.
fn build_file_structure(ascii_tree: &str, files: &[CollectedFile]) -> String {
    if files.is_empty() {
        return ascii_tree.to_string();
    }
    let mut out = String::from(ascii_tree);
    out.push('\n');
    for file in files {
        out.push_str(&format!("<file path=\"{}\">\n", file.rel_path));
        out.push_str(&file.content);
        if !file.content.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("</file>\n");
    }
    out
}

/// Rough token count: about one token per four characters, the common
/// heuristic for English-like source text.
fn estimate_tokens(content: &str) -> u64 {
    (content.chars().count() as u64).div_ceil(4)
}
