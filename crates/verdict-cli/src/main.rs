//! verdict: command-line front end for the moderation verdict ledger.
//!
//! State lives in a JSON snapshot file. Every command loads it, runs one
//! contract operation and, for writes that succeed, saves it back. Output is
//! pretty JSON on stdout; logs go to stderr.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use verdict_core::{Identity, LedgerSnapshot, ModerationState};
use verdict_runtime::providers::ProviderRegistry;
use verdict_runtime::{
    ComparativeConsensus, ConsensusConfig, ConsensusError, ConsensusEvaluator, ContentModeration,
};

#[derive(Parser)]
#[command(name = "verdict")]
#[command(about = "Guideline-based content moderation with a consensus-checked verdict ledger")]
struct Cli {
    /// Snapshot file holding guidelines and results
    #[arg(long, global = true, default_value = "verdict-ledger.json")]
    state: PathBuf,

    /// Identity recorded as guideline creator or moderator
    #[arg(long, global = true, env = "VERDICT_CALLER")]
    caller: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a new guideline
    AddGuideline { id: String, text: String },

    /// List every guideline in insertion order
    Guidelines,

    /// Show one guideline
    Guideline { id: String },

    /// Moderate one post against one guideline
    Moderate {
        post_id: String,
        guideline_id: String,
        content: String,

        #[command(flatten)]
        evaluator: EvaluatorArgs,
    },

    /// Moderate every post in a YAML or JSON file against one guideline
    Submit {
        file: PathBuf,

        #[arg(long)]
        guideline: String,

        #[command(flatten)]
        evaluator: EvaluatorArgs,
    },

    /// Show the result for a post under a guideline
    Result { post_id: String, guideline_id: String },

    /// Show every result for a post
    Post { post_id: String },

    /// Show every result, grouped by post
    Results,

    /// Show one page of results, newest first
    Page { page: i64, per_page: i64 },
}

#[derive(Args)]
struct EvaluatorArgs {
    /// LLM provider type; "anthropic" needs the `anthropic` feature (on by default)
    #[arg(long, default_value = "anthropic")]
    provider: String,

    /// Provider configuration as JSON
    #[arg(long, default_value = "{}")]
    provider_config: String,

    /// Evaluation runs per post (leader plus validators)
    #[arg(long)]
    runs: Option<usize>,

    /// Time limit per run, e.g. "45s"
    #[arg(long, value_parser = humantime::parse_duration)]
    run_timeout: Option<Duration>,
}

/// A post in a batch submission file.
#[derive(Debug, Deserialize)]
struct BatchPost {
    id: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct BatchReport {
    submitted: usize,
    succeeded: usize,
    failed: usize,
}

/// Stand-in for commands that never reach the evaluator.
struct NoEvaluator;

#[async_trait]
impl ConsensusEvaluator for NoEvaluator {
    async fn evaluate(&self, _content: &str, _guideline_text: &str) -> Result<Value, ConsensusError> {
        Err(ConsensusError::Execution(
            "no evaluator configured for this command".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "none"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let state = load_state(&cli.state)?;

    match cli.command {
        Command::AddGuideline { id, text } => {
            let caller = require_caller(cli.caller.as_deref())?;
            let contract = ContentModeration::with_state(state, Arc::new(NoEvaluator));
            contract.add_guideline(&caller, &id, &text)?;
            save_state(&contract, &cli.state)?;
            print_json(&contract.get_guideline(&id))
        }
        Command::Guidelines => {
            let contract = ContentModeration::with_state(state, Arc::new(NoEvaluator));
            print_json(&contract.get_all_guidelines())
        }
        Command::Guideline { id } => {
            let contract = ContentModeration::with_state(state, Arc::new(NoEvaluator));
            print_json(&contract.get_guideline(&id))
        }
        Command::Moderate {
            post_id,
            guideline_id,
            content,
            evaluator,
        } => {
            let caller = require_caller(cli.caller.as_deref())?;
            let contract = ContentModeration::with_state(state, build_evaluator(&evaluator)?);
            contract
                .moderate_content(&caller, &post_id, &content, &guideline_id)
                .await?;
            save_state(&contract, &cli.state)?;
            print_json(&contract.get_moderation_result(&post_id, &guideline_id))
        }
        Command::Submit {
            file,
            guideline,
            evaluator,
        } => {
            let caller = require_caller(cli.caller.as_deref())?;
            let posts = read_batch(&file)?;
            let contract = ContentModeration::with_state(state, build_evaluator(&evaluator)?);
            let report = submit_batch(&contract, &caller, &guideline, &posts).await;
            if report.succeeded > 0 {
                save_state(&contract, &cli.state)?;
            }
            print_json(&report)
        }
        Command::Result {
            post_id,
            guideline_id,
        } => {
            let contract = ContentModeration::with_state(state, Arc::new(NoEvaluator));
            print_json(&contract.get_moderation_result(&post_id, &guideline_id))
        }
        Command::Post { post_id } => {
            let contract = ContentModeration::with_state(state, Arc::new(NoEvaluator));
            print_json(&contract.get_post_moderation_results(&post_id))
        }
        Command::Results => {
            let contract = ContentModeration::with_state(state, Arc::new(NoEvaluator));
            print_json(&contract.get_all_moderation_results())
        }
        Command::Page { page, per_page } => {
            let contract = ContentModeration::with_state(state, Arc::new(NoEvaluator));
            print_json(&contract.get_moderation_results_paginated(page, per_page))
        }
    }
}

fn require_caller(caller: Option<&str>) -> Result<Identity> {
    let caller = caller
        .filter(|c| !c.trim().is_empty())
        .context("--caller (or VERDICT_CALLER) is required for this command")?;
    Ok(Identity::new(caller))
}

fn load_state(path: &Path) -> Result<ModerationState> {
    if !path.exists() {
        info!(path = %path.display(), "No state file, starting empty");
        return Ok(ModerationState::new());
    }

    let state = LedgerSnapshot::from_file(path)
        .and_then(LedgerSnapshot::restore)
        .with_context(|| format!("loading state from {}", path.display()))?;
    Ok(state)
}

fn save_state(contract: &ContentModeration, path: &Path) -> Result<()> {
    contract
        .snapshot()
        .write_file(path)
        .with_context(|| format!("saving state to {}", path.display()))
}

fn build_evaluator(args: &EvaluatorArgs) -> Result<Arc<dyn ConsensusEvaluator>> {
    let provider_config: Value =
        serde_json::from_str(&args.provider_config).context("parsing --provider-config")?;
    let provider = ProviderRegistry::with_defaults().create(&args.provider, &provider_config)?;

    let mut config = ConsensusConfig::default();
    if let Some(runs) = args.runs {
        config.runs = runs;
    }
    if let Some(run_timeout) = args.run_timeout {
        config.run_timeout = run_timeout;
    }

    Ok(Arc::new(ComparativeConsensus::new(provider, config)?))
}

fn read_batch(path: &Path) -> Result<Vec<BatchPost>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    // JSON is a subset of YAML, one parser covers both.
    serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Moderate posts one at a time. Failures are logged and skipped.
async fn submit_batch(
    contract: &ContentModeration,
    caller: &Identity,
    guideline_id: &str,
    posts: &[BatchPost],
) -> BatchReport {
    let mut succeeded = 0;
    for post in posts {
        match contract
            .moderate_content(caller, &post.id, &post.content, guideline_id)
            .await
        {
            Ok(()) => {
                succeeded += 1;
                info!(post_id = %post.id, "Post moderated");
            }
            Err(e) => warn!(post_id = %post.id, error = %e, "Post moderation failed"),
        }
    }

    BatchReport {
        submitted: posts.len(),
        succeeded,
        failed: posts.len() - succeeded,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
