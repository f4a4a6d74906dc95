use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::Parser;
use tracing::info;

use newstrends::aggregate::Aggregator;
use newstrends::cli::*;
use newstrends::config::AppConfig;
use newstrends::error::NewstrendsError;
use newstrends::fetch::{FetchJob, Fetcher, HttpSource};
use newstrends::http::{self, AppState};
use newstrends::schedule::{Scheduler, run_daily_rollup};
use newstrends::score::{ScoreRequest, Scorer};
use newstrends::storage::{
    MemoryCache, MemoryStore, PgTrendStore, RedisCache, TrendCache, TrendStore,
};

#[tokio::main]
async fn main() -> Result<(), NewstrendsError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Arc::new(AppConfig::from_env()?);

    match cli.command {
        Command::Serve(args) => cmd_serve(args, config).await,
        Command::Ingest(args) => cmd_ingest(args, config).await,
        Command::Rollup(args) => cmd_rollup(args, config).await,
        Command::Score(args) => cmd_score(args, config).await,
    }
}

/// Long-lived store and cache handles, established once. Connection
/// failure here is the only fatal error in the system.
async fn connect(
    config: &AppConfig,
    in_memory: bool,
) -> Result<(Arc<dyn TrendStore>, Arc<dyn TrendCache>), NewstrendsError> {
    if in_memory {
        info!("using in-memory store and cache");
        return Ok((Arc::new(MemoryStore::new()), Arc::new(MemoryCache::new())));
    }
    let store = PgTrendStore::connect(config.require_database_url()?).await?;
    let cache = RedisCache::connect(&config.redis).await?;
    Ok((Arc::new(store), Arc::new(cache)))
}

fn build_pipeline(
    store: Arc<dyn TrendStore>,
    cache: Arc<dyn TrendCache>,
    config: &Arc<AppConfig>,
) -> Result<(Aggregator, Arc<Fetcher>, Arc<Scorer>), NewstrendsError> {
    let aggregator = Aggregator::new(Arc::clone(&store), cache, config);
    let source = Arc::new(HttpSource::new()?);
    let fetcher = Arc::new(Fetcher::new(
        source,
        aggregator.clone(),
        Arc::clone(config),
    ));
    let scorer = Arc::new(Scorer::new(store, Arc::clone(&fetcher)));
    Ok((aggregator, fetcher, scorer))
}

async fn cmd_serve(args: ServeArgs, config: Arc<AppConfig>) -> Result<(), NewstrendsError> {
    let (store, cache) = connect(&config, args.memory).await?;
    let (aggregator, fetcher, scorer) =
        build_pipeline(Arc::clone(&store), Arc::clone(&cache), &config)?;

    let _jobs = Scheduler::new(Arc::clone(&fetcher), aggregator, Arc::clone(&config)).spawn();

    let state = AppState {
        store,
        cache,
        fetcher,
        scorer,
        config: Arc::clone(&config),
    };
    let app = http::router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(port = config.port, "HTTP API listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn cmd_ingest(args: IngestArgs, config: Arc<AppConfig>) -> Result<(), NewstrendsError> {
    let (store, cache) = connect(&config, false).await?;
    let (_, fetcher, _) = build_pipeline(store, cache, &config)?;

    let timestamp = match args.time {
        Some(raw) => raw
            .parse::<DateTime<Utc>>()
            .map_err(|_| NewstrendsError::InvalidDate(raw))?,
        None => Utc::now(),
    };

    let outcome = fetcher
        .fetch_and_process(timestamp.date_naive(), FetchJob::realtime(timestamp))
        .await?;
    eprintln!("Ingested: {outcome:?}");
    Ok(())
}

async fn cmd_rollup(args: RollupArgs, config: Arc<AppConfig>) -> Result<(), NewstrendsError> {
    let (store, cache) = connect(&config, false).await?;
    let (aggregator, fetcher, _) = build_pipeline(store, cache, &config)?;

    let date = args.date.unwrap_or_else(|| Utc::now().date_naive());
    let slots = run_daily_rollup(&fetcher, &aggregator, date).await?;
    eprintln!("Rolled up {date} from {slots} slot(s)");
    Ok(())
}

async fn cmd_score(args: ScoreArgs, config: Arc<AppConfig>) -> Result<(), NewstrendsError> {
    let (store, cache) = connect(&config, false).await?;
    let (_, _, scorer) = build_pipeline(store, cache, &config)?;

    let mut request = ScoreRequest::new(args.date.unwrap_or_else(|| Utc::now().date_naive()));
    request.category = args.category.parse()?;
    request.window_days = http::trends::parse_window(&args.window);
    request.top_n = args.limit.unwrap_or(config.top_n);

    let ranked = scorer.score_trends(request).await?;
    println!("{}", serde_json::to_string_pretty(&ranked)?);
    eprintln!("Scored {} keyword(s)", ranked.len());
    Ok(())
}
