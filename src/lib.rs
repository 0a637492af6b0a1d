//! # shotgun_context
//!
//! Bundles a source tree into a single LLM-ready context document (an
//! ASCII directory tree plus the verbatim contents of a selected file
//! subset) and optionally dispatches that document to a remote LLM
//! provider.
//!
//! ## Organization
//! - **ignore_engine**: layered, priority-ordered ignore classification
//! - **scanner**: single-pass filesystem walk building a [`scanner::FileTree`]
//! - **collector**: reads selected file bodies, skipping binaries
//! - **tree**: ASCII tree rendering
//! - **template**: `minijinja`-backed context document rendering
//! - **generator**: the scan → tree → collect → template pipeline
//! - **llm**: provider abstraction (OpenAI/Anthropic/Gemini/sub-process)
//! - **service**: the application-level `generate` / `send_to_llm` entry points
//! - **cli**: command-line flag definitions for the `shotgun` binary
//! - **env_config**: CLI-only environment credential fallback

pub mod cancel;
pub mod cli;
pub mod collector;
pub mod constants;
pub mod env_config;
pub mod error;
pub mod generator;
pub mod ignore_engine;
pub mod llm;
pub mod progress;
pub mod scanner;
pub mod service;
pub mod template;
pub mod tree;
pub mod util;

pub use error::{Result, ShotgunError};
