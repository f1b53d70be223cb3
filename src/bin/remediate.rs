//! # Remediation CLI
//!
//! Submits a remediation query, lets auto-executable prechecks run, and prints
//! the resulting execution records as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use remediation_core::config::{ConfigLoader, RemediationConfig};
use remediation_core::logging::init_structured_logging;
use remediation_core::orchestration::{StepOrchestrator, SubmissionOutcome, TaskLister};
use remediation_core::HttpRemediationClient;

#[derive(Parser, Debug)]
#[command(name = "remediate")]
#[command(about = "Submit remediation queries and drive their steps")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file path (default: ./remediation.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// User submitting the query (default: auth.user_id from config)
    #[arg(short, long)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Classify a query and run its auto-executable prechecks
    Submit {
        /// Free-text description of the problem
        query: String,

        /// Skip classification and use this task id
        #[arg(long)]
        task_id: Option<String>,
    },

    /// List the task catalogue
    Tasks,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_structured_logging(&config.logging);

    match cli.command {
        Commands::Submit { query, task_id } => {
            let user_id = cli.user.unwrap_or_else(|| config.auth.user_id.clone());
            let orchestrator = StepOrchestrator::from_config(&config)
                .context("Failed to create remediation client")?;

            let outcome = orchestrator
                .submit_task(&query, &user_id, task_id.as_deref())
                .await?;

            match outcome {
                SubmissionOutcome::Ready(task) => {
                    info!(task_id = %task.task_id, "Task resolved, waiting for scheduled steps");
                    orchestrator.wait_for_scheduled().await;
                    let output = serde_json::json!({
                        "task": task.as_ref(),
                        "executions": orchestrator.records_for_task(&task.task_id),
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                SubmissionOutcome::DisambiguationRequired { query, candidates } => {
                    let output = serde_json::json!({
                        "disambiguationRequired": true,
                        "query": query,
                        "candidates": candidates,
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
            }
        }
        Commands::Tasks => {
            let client = HttpRemediationClient::new(&config)
                .context("Failed to create remediation client")?;
            let tasks = client.list_tasks().await?;
            println!("{}", serde_json::to_string_pretty(&tasks)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<RemediationConfig> {
    let loader = match path {
        Some(path) => {
            anyhow::ensure!(path.is_file(), "Config file not found: {}", path.display());
            ConfigLoader::with_search_paths(vec![path.to_path_buf()])
        }
        None => ConfigLoader::new(),
    };
    loader.load().context("Failed to load configuration")
}
