use crate::commands::{run_fetch, run_send};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use hkex_filings::config::AppConfig;
use hkex_filings::error::AppError;
use hkex_filings::telemetry;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "hkex-ap",
    about = "Collect the previous day's HKEX Application Proof and PHIP filings and email a digest",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape the listings page and save the digest JSON
    Fetch(FetchArgs),
    /// Email the most recently saved digest
    Send(SendArgs),
    /// Fetch then send (default command)
    Run(RunArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct FetchArgs {
    /// Parse a saved copy of the listings page instead of launching Chrome
    #[arg(long)]
    pub(crate) html: Option<PathBuf>,
    /// Posting date to collect (YYYY-MM-DD, defaults to yesterday in HKT)
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Override the configured data directory
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SendArgs {
    /// Print the email instead of sending it
    #[arg(long)]
    pub(crate) dry_run: bool,
    /// Override the configured data directory
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct RunArgs {
    #[command(flatten)]
    pub(crate) fetch: FetchArgs,
    /// Print the email instead of sending it
    #[arg(long)]
    pub(crate) dry_run: bool,
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Run(RunArgs::default()));

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    info!(?config.environment, data_dir = %config.data_dir.display(), "hkex digest starting");

    match command {
        Command::Fetch(args) => run_fetch(&config, args).map(|_| ()),
        Command::Send(args) => run_send(&config, args),
        Command::Run(RunArgs { fetch, dry_run }) => {
            let data_dir = fetch.data_dir.clone();
            run_fetch(&config, fetch)?;
            run_send(&config, SendArgs { dry_run, data_dir })
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
