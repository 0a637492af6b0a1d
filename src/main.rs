//! `shotgun`: bundles a source tree into an LLM context document and, on
//! request, dispatches it to a configured provider.

mod cancel;
mod cli;
mod collector;
mod constants;
mod env_config;
mod error;
mod generator;
mod ignore_engine;
mod llm;
mod progress;
mod scanner;
mod service;
mod template;
mod tree;
mod util;

use std::collections::HashMap;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use error::ShotgunError;
use generator::GenerateConfig;
use llm::registry::{register_default_providers, ProviderRegistry};
use llm::LLMConfig;
use scanner::ScanConfig;
use service::ApplicationService;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), ShotgunError> {
    let registry = ProviderRegistry::new();
    register_default_providers(&registry);
    let service = ApplicationService::new(&registry);

    let scan_config = ScanConfig {
        include_hidden: cli.hidden,
        respect_gitignore: cli.gitignore,
        respect_tool_ignore: true,
        ignore_patterns: cli.ignore_patterns.clone(),
        include_patterns: cli.include_patterns.clone(),
        ..ScanConfig::default()
    };

    let mut template_vars = HashMap::new();
    template_vars.insert("TASK".to_string(), cli.task.clone().unwrap_or_default());
    if let Some(rules) = &cli.rules {
        template_vars.insert("RULES".to_string(), rules.clone());
    }
    let template_text = match &cli.template {
        Some(path) => Some(std::fs::read_to_string(path).map_err(ShotgunError::Io)?),
        None => None,
    };

    let generate_config = GenerateConfig {
        root_path: cli.source_dir.clone(),
        scan_config,
        selections: None,
        template_text,
        template_vars,
        max_file_size: cli.max_file_size.unwrap_or(0),
        max_total_size: cli.max_total_size.unwrap_or(0),
        max_files: cli.max_files.unwrap_or(0),
        skip_binary: true,
        output_path: cli.output.clone(),
        enforce_limit: !cli.allow_truncate,
    };

    println!("Scanning {}…", cli.source_dir.display());
    let result = service.generate(generate_config)?;
    println!(
        "Wrote {} ({} files, {} bytes, ~{} tokens) to {}",
        cli.source_dir.display(),
        result.file_count,
        result.content_size,
        result.token_estimate,
        result.output_path.as_ref().map(|p| p.display().to_string()).unwrap_or_default(),
    );

    if cli.send {
        let provider = cli
            .provider
            .clone()
            .ok_or_else(|| ShotgunError::InvalidConfig("--send requires --provider".to_string()))?;
        let model = cli.model.clone().ok_or_else(|| ShotgunError::InvalidConfig("--send requires --model".to_string()))?;

        let llm_config = env_config::apply_env_fallbacks(LLMConfig {
            provider,
            model,
            api_key: cli.api_key.clone().unwrap_or_default(),
            timeout_seconds: cli.timeout,
            ..Default::default()
        });

        println!("Sending to {}…", llm_config.provider);
        let (llm_result, send_err) = service
            .send_to_llm_with_progress(
                &result.content,
                llm_config,
                true,
                result.output_path.as_ref(),
                None,
                &cancel::CancellationToken::new(),
            )
            .await;

        if let Some(llm_result) = llm_result {
            println!("{}", llm_result.response);
        }
        send_err?;
    }

    Ok(())
}
