use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tfaudit_core::{
    collect_files, post_run_comments, render_run, AuditPipeline, AuditRun, CiContext,
    GithubCommenter, Granularity, HfChatClient, InferenceSettings, PipelineConfig,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "tfaudit",
    author,
    version,
    about = "AI-powered Terraform security auditor"
)]
struct Cli {
    /// Terraform file or directory to audit
    path: PathBuf,

    /// Audit whole files or individual resource blocks
    #[arg(long, value_enum, default_value_t = GranularityArg::File)]
    granularity: GranularityArg,

    /// Replace the built-in system prompt with the contents of this file
    #[arg(long, value_name = "FILE")]
    prompt_file: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum GranularityArg {
    File,
    Resource,
}

impl From<GranularityArg> for Granularity {
    fn from(arg: GranularityArg) -> Self {
        match arg {
            GranularityArg::File => Granularity::File,
            GranularityArg::Resource => Granularity::Resource,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = PipelineConfig {
        granularity: cli.granularity.into(),
        ..PipelineConfig::default()
    };
    if let Some(path) = &cli.prompt_file {
        config.system_prompt = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read prompt file {}", path.display()))?;
    }

    // Collect before touching credentials so that "nothing to audit" succeeds
    // without an API key and without any network traffic.
    if collect_files(&cli.path, &config.extension).is_empty() {
        println!("No Terraform files found to audit in the specified path.");
        return Ok(ExitCode::SUCCESS);
    }

    let settings = InferenceSettings::from_env()?;
    let model = HfChatClient::new(&settings)?;
    let pipeline = AuditPipeline::with_config(model, config);
    let run = pipeline.run(&cli.path).await?;

    print!("{}", render_run(&run)?);
    post_pr_comments(&run).await;

    Ok(if run.vulnerabilities_found() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

/// Best-effort pull-request enrichment. Every failure here is logged and
/// swallowed; the exit code comes from the audit outcome alone.
async fn post_pr_comments(run: &AuditRun) {
    let Some(ctx) = CiContext::from_env() else {
        tracing::info!("not a GitHub Actions environment, skipping PR comment");
        return;
    };
    let pr_number = match ctx.pull_request_number() {
        Ok(Some(number)) => number,
        Ok(None) => {
            tracing::info!("not a pull request event, skipping PR comment");
            return;
        }
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "could not read CI event file, skipping PR comment");
            return;
        }
    };
    let commenter = match GithubCommenter::new(&ctx, pr_number) {
        Ok(commenter) => commenter,
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "could not build GitHub client, skipping PR comment");
            return;
        }
    };
    post_run_comments(&commenter, run).await;
    tracing::info!(pr_number, "posted audit results to pull request");
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tokio=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init();
}
