//! `mgen` command-line tool.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use mgen_codegen::{CodegenConfig, StaticCheck, StaticIssueDetector};
use mgen_render::RenderConfig;
use mgen_worker::{init_tracing, RecoveryLoop, WorkerConfig};

#[derive(Parser)]
#[command(name = "mgen", version, about = "Turn prompts into rendered animations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a scene script for a prompt and render it
    Render {
        /// Description of the animation
        #[arg(long)]
        prompt: String,
        /// Output directory for the script and the final video
        #[arg(long)]
        out: PathBuf,
        /// Render attempts before giving up (defaults to PIPELINE_MAX_RETRIES)
        #[arg(long)]
        max_retries: Option<u32>,
    },
    /// Check an existing scene script without rendering it
    Check {
        /// Script file
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Install rustls crypto provider (required for TLS/HTTPS); an already
    // installed provider is fine.
    let _ = rustls::crypto::ring::default_provider().install_default();

    dotenvy::dotenv().ok();
    init_tracing("info");

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let worker = WorkerConfig::from_env();
    let profile = worker.load_profile().context("loading target profile")?;

    match cli.command {
        Command::Render {
            prompt,
            out,
            max_retries,
        } => {
            let codegen = CodegenConfig::from_env()?;
            let render = RenderConfig::from_env();
            let max_retries = max_retries.unwrap_or(worker.max_retries);

            info!(out = %out.display(), max_retries, "Starting render");
            let recovery = RecoveryLoop::from_config(codegen, render, profile)?;
            let video = recovery.produce_video(&prompt, &out, max_retries).await?;

            info!(attempts = video.attempts, scene = %video.source.entry_scene, "Render finished");
            println!("{}", video.artifact_path.display());
            Ok(())
        }
        Command::Check { path } => {
            let source = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;

            mgen_script::check_syntax(&source)?;
            let scene = mgen_script::find_entry_scene(&source, &profile)?
                .context("no scene class found")?;

            match StaticIssueDetector::from_profile(&profile).check(&source) {
                StaticCheck::Passed => {
                    println!("ok: scene {}", scene);
                    Ok(())
                }
                StaticCheck::Failed { reason, .. } => anyhow::bail!(reason),
            }
        }
    }
}
