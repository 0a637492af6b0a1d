//! Canonical constants: built-in ignore patterns, default size caps, and the
//! extension-to-language table used by the content collector and the
//! template renderer's code fences.

/// Crate version string shown by the CLI's `--version` flag.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Hard-coded gitignore-style patterns applied by the BuiltIn ignore layer,
/// regardless of any discovered `.gitignore`. Covers VCS directories,
/// editor/IDE junk, language build/cache directories, binary media,
/// archives, and this tool's own output artifacts.
pub const BUILT_IN_IGNORE_PATTERNS: &[&str] = &[
    // VCS
    ".git/",
    ".hg/",
    ".svn/",
    ".bzr/",
    // Editor / IDE
    ".idea/",
    ".vscode/",
    "*.swp",
    "*.swo",
    ".DS_Store",
    "Thumbs.db",
    // Language build/cache directories
    "target/",
    "node_modules/",
    "dist/",
    "build/",
    "coverage/",
    "__pycache__/",
    "*.pyc",
    ".pytest_cache/",
    ".mypy_cache/",
    "vendor/",
    ".venv/",
    "venv/",
    ".gradle/",
    ".tox/",
    // Binary media / archives
    "*.zip",
    "*.tar",
    "*.tar.gz",
    "*.tgz",
    "*.rar",
    "*.7z",
    "*.jpg",
    "*.jpeg",
    "*.png",
    "*.gif",
    "*.bmp",
    "*.ico",
    "*.mp3",
    "*.mp4",
    "*.mov",
    "*.avi",
    "*.pdf",
    // This tool's own output
    "shotgun-prompt-*.md",
];

/// Default per-file and cumulative size cap, in bytes, filled in by
/// `ContextGenerator::validate_config` when the caller leaves either at 0.
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 10 * 1024 * 1024; // 10 MiB

/// Default cap on the number of files counted/collected.
pub const DEFAULT_MAX_FILES: usize = 1000;

/// Number of bytes read from the start of a file to decide whether it is
/// binary (skip rule: a 0x00 byte, or the sample not being valid UTF-8).
pub const BINARY_SNIFF_LEN: usize = 1024;

/// Base names that map directly to a language/fence tag without consulting
/// the extension table.
pub const LANGUAGE_BY_BASENAME: &[(&str, &str)] = &[
    ("Dockerfile", "dockerfile"),
    ("Makefile", "makefile"),
    ("makefile", "makefile"),
    ("GNUmakefile", "makefile"),
    ("go.mod", "go-module"),
    ("go.sum", "go-module"),
    ("CMakeLists.txt", "cmake"),
    ("Rakefile", "ruby"),
    ("Gemfile", "ruby"),
    ("Vagrantfile", "ruby"),
    ("Procfile", "yaml"),
];

/// Extension (lowercased, no leading dot) to Markdown code-fence language
/// tag. Falls back to `"text"` for anything unlisted.
pub const LANGUAGE_BY_EXTENSION: &[(&str, &str)] = &[
    ("rs", "rust"),
    ("py", "python"),
    ("pyw", "python"),
    ("js", "javascript"),
    ("mjs", "javascript"),
    ("cjs", "javascript"),
    ("jsx", "jsx"),
    ("ts", "typescript"),
    ("tsx", "tsx"),
    ("go", "go"),
    ("java", "java"),
    ("kt", "kotlin"),
    ("kts", "kotlin"),
    ("c", "c"),
    ("h", "c"),
    ("cc", "cpp"),
    ("cpp", "cpp"),
    ("cxx", "cpp"),
    ("hpp", "cpp"),
    ("hxx", "cpp"),
    ("cs", "csharp"),
    ("rb", "ruby"),
    ("php", "php"),
    ("swift", "swift"),
    ("m", "objective-c"),
    ("scala", "scala"),
    ("clj", "clojure"),
    ("ex", "elixir"),
    ("exs", "elixir"),
    ("erl", "erlang"),
    ("hs", "haskell"),
    ("lua", "lua"),
    ("pl", "perl"),
    ("r", "r"),
    ("jl", "julia"),
    ("zig", "zig"),
    ("nim", "nim"),
    ("dart", "dart"),
    ("sh", "bash"),
    ("bash", "bash"),
    ("zsh", "bash"),
    ("fish", "fish"),
    ("ps1", "powershell"),
    ("bat", "batch"),
    ("cmd", "batch"),
    ("sql", "sql"),
    ("html", "html"),
    ("htm", "html"),
    ("css", "css"),
    ("scss", "scss"),
    ("sass", "sass"),
    ("less", "less"),
    ("json", "json"),
    ("jsonc", "jsonc"),
    ("toml", "toml"),
    ("yaml", "yaml"),
    ("yml", "yaml"),
    ("xml", "xml"),
    ("svg", "xml"),
    ("md", "markdown"),
    ("markdown", "markdown"),
    ("rst", "rst"),
    ("tex", "latex"),
    ("proto", "protobuf"),
    ("graphql", "graphql"),
    ("gql", "graphql"),
    ("dockerfile", "dockerfile"),
    ("tf", "hcl"),
    ("hcl", "hcl"),
    ("vue", "vue"),
    ("svelte", "svelte"),
    ("diff", "diff"),
    ("patch", "diff"),
    ("ini", "ini"),
    ("cfg", "ini"),
    ("env", "bash"),
];

/// Looks up the fence/language tag for a file by base name first, then by
/// lowercased extension; falls back to `"text"`.
pub fn detect_language(filename: &str) -> &'static str {
    if let Some((_, lang)) = LANGUAGE_BY_BASENAME.iter().find(|(name, _)| *name == filename) {
        return lang;
    }
    let ext = filename.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    if !ext.is_empty() && ext != filename {
        if let Some((_, lang)) = LANGUAGE_BY_EXTENSION.iter().find(|(e, _)| *e == ext) {
            return lang;
        }
    }
    "text"
}
