//! repometrics - fetch GitHub repository metadata and derive popularity metrics

use anyhow::Result;
use clap::{Parser, Subcommand};
use repometrics_common::logging::{init_logging, LogConfig};
use repometrics_common::table::ensure_parent_dir;
use repometrics_ingest::config::{FetchConfig, PathsConfig};
use repometrics_ingest::{github, process};
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "repometrics")]
#[command(author, version, about = "GitHub repository metrics pipeline")]
struct Cli {
    /// Pipeline stage to run
    #[command(subcommand)]
    stage: Stage,
}

#[derive(Subcommand, Debug)]
enum Stage {
    /// Fetch the most-starred repositories into the raw table
    Fetch,

    /// Derive metrics from the raw table into the processed table
    Process,
}

impl Stage {
    fn log_file_name(&self) -> &'static str {
        match self {
            Stage::Fetch => "fetch_data.log",
            Stage::Process => "process_data.log",
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let paths = PathsConfig::from_env();

    let log_config =
        LogConfig::for_file(paths.log_dir.clone(), cli.stage.log_file_name()).merge_env();
    let _guard = match log_config.map(|config| init_logging(&config)) {
        Ok(Ok(guard)) => guard,
        Ok(Err(e)) | Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            return ExitCode::FAILURE;
        },
    };

    let outcome = match cli.stage {
        Stage::Fetch => run_fetch(&paths).await.inspect_err(|e| {
            error!(error = ?e, "An error occurred during execution.");
        }),
        Stage::Process => run_process(&paths).inspect_err(|e| {
            error!(error = ?e, "An error occurred during data processing.");
        }),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

async fn run_fetch(paths: &PathsConfig) -> Result<()> {
    let rows = github::run(FetchConfig::from_env()?, &paths.raw_path).await?;
    info!(rows = rows, "Fetch complete");
    Ok(())
}

fn run_process(paths: &PathsConfig) -> Result<()> {
    ensure_parent_dir(&paths.processed_path)?;

    let rows = process::run(&paths.raw_path, &paths.processed_path)?;
    info!(rows = rows, "Processing complete");
    Ok(())
}
