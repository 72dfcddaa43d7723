//! Cost Guard CLI
//!
//! Runs the cost spike and tag audit pipelines once and prints the result.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use costguard::config::LoggingConfig;
use costguard::jobs::Collaborators;
use costguard::models::FailedOutcome;
use costguard::Config;

/// Cost Guard - daily cost spike and tag compliance checks
#[derive(Parser)]
#[command(name = "costguard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "COSTGUARD_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check yesterday's cost against the trailing 7-day average
    CostSpike {
        /// Run as if today were this date (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },

    /// Audit resource tags against the compliance policy
    TagAudit {
        /// Date used for the report snapshot (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },

    /// Run the cost spike check and then the tag audit
    Run {
        /// Run as if today were this date (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },

    /// Print the effective configuration
    Config,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = parse_cli(None, std::env::args_os()).unwrap_or_else(|e| e.exit());

    if let Commands::Completions { shell } = &cli.command {
        generate_completions(*shell);
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            print_json(&json!(FailedOutcome::new(e.to_string())));
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.logging, cli.verbose);

    let result = match cli.command {
        Commands::CostSpike { as_of } => run_cost_spike(&config, resolve_date(as_of)).await,
        Commands::TagAudit { as_of } => run_tag_audit(&config, resolve_date(as_of)).await,
        Commands::Run { as_of } => Ok(run_all(&config, resolve_date(as_of)).await),
        Commands::Config => serde_json::to_value(&config).map_err(Into::into),
        Commands::Completions { .. } => unreachable!("handled before configuration"),
    };

    match result {
        Ok(value) => {
            let ok = value.get("ok").and_then(serde_json::Value::as_bool).unwrap_or(true);
            print_json(&value);
            if ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!(error = %e, "Run failed");
            print_json(&json!(FailedOutcome::new(format!("{e:#}"))));
            ExitCode::FAILURE
        }
    }
}

/// Load `.env` (the given file, or the one found from the working directory)
/// before parsing, so env-backed flags such as `--config` see its values
fn parse_cli<I, T>(dotenv: Option<&Path>, args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let _ = match dotenv {
        Some(path) => dotenvy::from_path(path),
        None => dotenvy::dotenv().map(|_| ()),
    };
    Cli::try_parse_from(args)
}

fn init_logging(config: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries the result document
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn resolve_date(as_of: Option<NaiveDate>) -> NaiveDate {
    as_of.unwrap_or_else(|| Utc::now().date_naive())
}

async fn run_cost_spike(config: &Config, today: NaiveDate) -> anyhow::Result<serde_json::Value> {
    info!(%today, "Starting cost spike check");
    let job = Collaborators::from_config(config)?.cost_spike_job(config)?;
    let outcome = job.run(today).await?;
    Ok(serde_json::to_value(outcome)?)
}

async fn run_tag_audit(config: &Config, today: NaiveDate) -> anyhow::Result<serde_json::Value> {
    info!(%today, "Starting tag audit");
    let job = Collaborators::from_config(config)?.tag_audit_job(config);
    let outcome = job.run(today).await?;
    Ok(serde_json::to_value(outcome)?)
}

/// Both pipelines, each allowed to fail without skipping the other
async fn run_all(config: &Config, today: NaiveDate) -> serde_json::Value {
    fn settle(result: anyhow::Result<serde_json::Value>, job: &str) -> serde_json::Value {
        result.unwrap_or_else(|e| {
            error!(job, error = %e, "Job failed");
            json!(FailedOutcome::new(format!("{e:#}")))
        })
    }

    let cost_spike = settle(run_cost_spike(config, today).await, "cost_spike");
    let tag_audit = settle(run_tag_audit(config, today).await, "tag_audit");
    let ok = [&cost_spike, &tag_audit]
        .iter()
        .all(|v| v["ok"].as_bool() == Some(true));

    json!({
        "ok": ok,
        "cost_spike": cost_spike,
        "tag_audit": tag_audit,
    })
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("Error rendering result: {e}"),
    }
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "costguard", &mut io::stdout());
}
