//! Command-line flag definitions. Mirrors the teacher CLI's short/long flag
//! and positional-source-directory conventions, reduced to what the
//! Application Service needs: no interactive prompting, no TUI, no
//! clipboard access.

use std::path::PathBuf;

use clap::Parser;

use crate::constants::VERSION;

#[derive(Parser, Debug)]
#[command(name = "shotgun", version = VERSION)]
#[command(about = "Bundle a source tree into an LLM context document and optionally dispatch it")]
#[command(long_about = "\
Scans a source directory, renders a context document (ASCII tree plus file
contents), and optionally sends it to an LLM provider.

EXAMPLES:
    shotgun                                        # bundle the current directory
    shotgun ./my-project --task \"Review this\"      # bundle with a task prompt
    shotgun . --provider openai --model gpt-4o --send")]
pub struct Cli {
    #[arg(value_name = "SOURCE_DIR", index = 1, default_value = ".")]
    pub source_dir: PathBuf,

    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    #[arg(short = 'i', long = "ignore", value_delimiter = ',')]
    pub ignore_patterns: Vec<String>,

    #[arg(short = 'I', long = "include", value_delimiter = ',')]
    pub include_patterns: Vec<String>,

    #[arg(short = 'g', long, default_value_t = true)]
    pub gitignore: bool,

    #[arg(long)]
    pub hidden: bool,

    #[arg(long)]
    pub task: Option<String>,

    #[arg(long)]
    pub rules: Option<String>,

    #[arg(long)]
    pub template: Option<PathBuf>,

    #[arg(long = "max-file-size")]
    pub max_file_size: Option<u64>,

    #[arg(long = "max-total-size")]
    pub max_total_size: Option<u64>,

    #[arg(long = "max-files")]
    pub max_files: Option<usize>,

    /// Truncate content that exceeds the size caps instead of failing.
    #[arg(long = "allow-truncate")]
    pub allow_truncate: bool,

    #[arg(long)]
    pub provider: Option<String>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long = "api-key")]
    pub api_key: Option<String>,

    #[arg(long, default_value_t = 300)]
    pub timeout: u64,

    /// After generating, dispatch the result to the configured provider.
    #[arg(long)]
    pub send: bool,
}
