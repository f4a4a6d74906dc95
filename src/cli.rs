use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "newstrends",
    version,
    about = "GDELT GKG trend pipeline: ingest, aggregate, score, serve"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the scheduler and the HTTP query API
    Serve(ServeArgs),
    /// One-shot realtime ingest of a quarter-hour slot
    Ingest(IngestArgs),
    /// One-shot daily rollup across a day's 96 slots
    Rollup(RollupArgs),
    /// Score a day's trends and print the ranked list as JSON
    Score(ScoreArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Use in-memory store and cache; nothing persists across restarts
    #[arg(long)]
    pub memory: bool,
}

#[derive(Args)]
pub struct IngestArgs {
    /// UTC instant to ingest, RFC 3339 (defaults to now; minutes floor to 15)
    #[arg(long)]
    pub time: Option<String>,
}

#[derive(Args)]
pub struct RollupArgs {
    /// UTC date, YYYY-MM-DD (defaults to today)
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

#[derive(Args)]
pub struct ScoreArgs {
    /// UTC date to score, YYYY-MM-DD (defaults to today)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Category: themes, persons, or orgs
    #[arg(long, default_value = "themes")]
    pub category: String,

    /// Baseline window: plain days, or Nd / Nm / Ny
    #[arg(long, default_value = "7d")]
    pub window: String,

    /// Maximum entries in the ranked list
    #[arg(long)]
    pub limit: Option<usize>,
}
