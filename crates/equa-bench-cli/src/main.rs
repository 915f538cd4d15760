#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode as ProcessExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;

use equa_bench_analytics::EngineConfig;
use equa_bench_core::ExitCode;
use equa_bench_model::{BenchmarkId, JobId};
use equa_bench_store::Store;

use equa_bench_cli::{job_status, recompute_stats, CliError};

#[derive(Parser)]
#[command(name = "equa-bench")]
#[command(about = "equa-bench analytics operations CLI")]
struct Cli {
    /// Emit machine-readable JSON instead of text.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create (or migrate) the analytics database schema.
    InitDb {
        #[arg(long)]
        db: PathBuf,
    },
    /// Recompute the global precomputed statistics for one benchmark,
    /// deleting the prior global rows first. Equivalent to the statistics
    /// phase of a finalize run, without re-ingesting anything.
    RecomputeStats {
        #[arg(long)]
        db: PathBuf,
        #[arg(long)]
        benchmark: String,
    },
    /// Show one upload job's status and progress.
    JobStatus {
        #[arg(long)]
        db: PathBuf,
        #[arg(long)]
        job: String,
    },
}

fn run(cli: &Cli) -> Result<serde_json::Value, CliError> {
    match &cli.command {
        Commands::InitDb { db } => {
            let _ = Store::open(db).map_err(|e| CliError::dependency(e.to_string()))?;
            Ok(json!({"db": db.display().to_string(), "initialized": true}))
        }
        Commands::RecomputeStats { db, benchmark } => {
            let benchmark = BenchmarkId::parse(benchmark)
                .map_err(|e| CliError::validation(e.to_string()))?;
            let mut store = Store::open(db).map_err(|e| CliError::dependency(e.to_string()))?;
            let written = recompute_stats(&mut store, &benchmark, EngineConfig::default())?;
            Ok(json!({
                "benchmark": benchmark.as_str(),
                "statistics_written": written,
            }))
        }
        Commands::JobStatus { db, job } => {
            let job = JobId::parse(job).map_err(|e| CliError::validation(e.to_string()))?;
            let store = Store::open(db).map_err(|e| CliError::dependency(e.to_string()))?;
            let job = job_status(&store, &job)?;
            serde_json::to_value(&job).map_err(|e| CliError::internal(e.to_string()))
        }
    }
}

fn main() -> ProcessExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env(equa_bench_core::ENV_EQUA_LOG_LEVEL)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(value) => {
            if cli.json {
                println!("{value}");
            } else {
                println!("{}", render_text(&value));
            }
            ProcessExitCode::from(ExitCode::Success as u8)
        }
        Err(err) => {
            if cli.json {
                eprintln!("{}", json!({"error": err.message}));
            } else {
                eprintln!("error: {}", err.message);
            }
            ProcessExitCode::from(err.exit_code as u8)
        }
    }
}

fn render_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}
