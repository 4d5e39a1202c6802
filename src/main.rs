//! katex-tags CLI
//!
//! Usage:
//!   katex-tags [--config FILE] download [--public-dir DIR] [--force] [--no-verify] [--json]
//!   katex-tags [--config FILE] check
//!   katex-tags [--config FILE] tags [--options JSON]
//!   katex-tags integrity FILE...

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;
use serde_json::Value;

use katex_tags::{
    sri_hash, validator, AssetDownloader, ConfigLoader, DownloadOptions, DownloadOutcome,
    KatexRenderer,
};

#[derive(Parser)]
#[command(name = "katex-tags")]
#[command(about = "KaTeX tag generation and asset management")]
struct Cli {
    /// JSON configuration file merged over the defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download KaTeX assets to the public directory for offline use
    Download {
        /// Static root; assets land in <DIR>/vendor/katex
        #[arg(long, default_value = "public")]
        public_dir: PathBuf,

        /// Overwrite existing files
        #[arg(long)]
        force: bool,

        /// Skip checking required files against the configured SRI hashes
        #[arg(long)]
        no_verify: bool,

        /// Print the download report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration and list every problem
    Check,

    /// Print the stylesheet and script tags
    Tags {
        /// Extra auto-render options as a JSON object
        #[arg(long)]
        options: Option<String>,
    },

    /// Print the Subresource Integrity hash of local files
    Integrity {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Value> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = path {
        loader = loader.file(path);
    }
    loader.load().context("failed to load configuration")
}

fn confirm_overwrite(target: &Path) -> bool {
    dialoguer::Confirm::new()
        .with_prompt(format!(
            "KaTeX assets already exist in {}. Do you want to overwrite them?",
            target.display()
        ))
        .default(false)
        .interact()
        .unwrap_or(false)
}

/// Returns whether the command succeeded
fn run(cli: Cli) -> anyhow::Result<bool> {
    match cli.command {
        Command::Download {
            public_dir,
            force,
            no_verify,
            json,
        } => {
            let renderer = KatexRenderer::new(load_config(cli.config.as_deref())?)?;
            let options = DownloadOptions {
                force,
                verify_integrity: !no_verify,
                ..Default::default()
            };
            let downloader = AssetDownloader::new(&renderer, &public_dir, options)?;
            info!("Downloading KaTeX assets...");

            match downloader.run(confirm_overwrite)? {
                DownloadOutcome::Cancelled => println!("Download cancelled."),
                DownloadOutcome::Completed(report) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    } else {
                        for asset in &report.assets {
                            println!("{}  {}", asset.integrity, asset.file);
                        }
                        println!("KaTeX assets downloaded successfully.");
                        println!(
                            "To use local assets, set KATEX_USE_LOCAL_ASSETS=true in your environment."
                        );
                    }
                }
            }
            Ok(true)
        }
        Command::Check => {
            let config = load_config(cli.config.as_deref())?;
            let result = validator::check(&config);
            if result.is_valid() {
                println!("Configuration is valid.");
                return Ok(true);
            }
            for error in result.errors() {
                println!("error: {}", error);
            }
            Ok(false)
        }
        Command::Tags { options } => {
            let renderer = KatexRenderer::new(load_config(cli.config.as_deref())?)?;
            let options: Value = match options {
                Some(raw) => serde_json::from_str(&raw).context("--options is not valid JSON")?,
                None => Value::Null,
            };
            println!("{}", renderer.generate_stylesheet());
            println!("{}", renderer.generate_scripts_with(&options)?);
            Ok(true)
        }
        Command::Integrity { files } => {
            for file in files {
                let bytes = std::fs::read(&file)
                    .with_context(|| format!("failed to read {}", file.display()))?;
                println!("{}  {}", sri_hash(&bytes), file.display());
            }
            Ok(true)
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
