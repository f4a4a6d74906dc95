//! Recurring jobs on the UTC wall clock: the quarter-hour realtime ingest
//! and the end-of-day rollup that re-walks all 96 slots of the day. Both
//! loops log individual failures and keep running; nothing here aborts the
//! process.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveDate, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::aggregate::Aggregator;
use crate::config::AppConfig;
use crate::error::NewstrendsError;
use crate::fetch::pipeline::DAILY_SLOT_TIMEOUT;
use crate::fetch::{FetchJob, Fetcher};

pub struct Scheduler {
    fetcher: Arc<Fetcher>,
    aggregator: Aggregator,
    config: Arc<AppConfig>,
}

impl Scheduler {
    pub fn new(fetcher: Arc<Fetcher>, aggregator: Aggregator, config: Arc<AppConfig>) -> Self {
        Self {
            fetcher,
            aggregator,
            config,
        }
    }

    /// Spawn both recurring jobs. The handles run for the life of the
    /// process; callers keep them only to abort on shutdown.
    pub fn spawn(self) -> Vec<JoinHandle<()>> {
        let realtime = {
            let fetcher = Arc::clone(&self.fetcher);
            let interval_min = self.config.realtime_interval_min;
            tokio::spawn(realtime_loop(fetcher, interval_min))
        };
        let daily = tokio::spawn(daily_loop(self.fetcher, self.aggregator, self.config));
        vec![realtime, daily]
    }
}

async fn realtime_loop(fetcher: Arc<Fetcher>, interval_min: u64) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_min * 60));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(interval_min, "realtime ingest job started");

    loop {
        ticker.tick().await;
        let now = Utc::now();
        if let Err(e) = fetcher
            .fetch_and_process(now.date_naive(), FetchJob::realtime(now))
            .await
        {
            warn!(error = %e, "realtime ingest failed");
        }
    }
}

async fn daily_loop(fetcher: Arc<Fetcher>, aggregator: Aggregator, config: Arc<AppConfig>) {
    info!(hour = config.daily_hour_utc, "daily rollup job started");
    loop {
        let wait = until_next_hour(Utc::now(), config.daily_hour_utc);
        tokio::time::sleep(wait).await;

        // Anchor on the most recently completed slot so the default
        // midnight run rolls up the day that just ended, not the empty
        // day that just started.
        let date = (Utc::now() - chrono::Duration::minutes(15)).date_naive();
        match run_daily_rollup(&fetcher, &aggregator, date).await {
            Ok(slots) => info!(%date, slots, "daily rollup complete"),
            Err(e) => warn!(%date, error = %e, "daily rollup failed"),
        }
    }
}

/// Walk a day's 96 fifteen-minute slots sequentially (bounding memory to
/// one file at a time), collect each, then aggregate once. Failed slots
/// are logged and skipped; returns how many slots contributed.
pub async fn run_daily_rollup(
    fetcher: &Fetcher,
    aggregator: &Aggregator,
    date: NaiveDate,
) -> Result<usize, NewstrendsError> {
    let mut collectors = Vec::new();
    for slot in day_slots(date) {
        match fetcher.collect_slot(slot, DAILY_SLOT_TIMEOUT).await {
            Ok(collector) => collectors.push(collector),
            Err(e) => warn!(slot = %slot, error = %e, "rollup slot fetch failed"),
        }
    }

    if collectors.is_empty() {
        return Err(NewstrendsError::NoArtifact(date.to_string()));
    }
    let slots = collectors.len();
    aggregator.aggregate_daily(collectors, date, None).await?;
    Ok(slots)
}

/// The 96 quarter-hour instants of a UTC day.
pub fn day_slots(date: NaiveDate) -> Vec<DateTime<Utc>> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc();
    (0..96)
        .map(|i| midnight + chrono::Duration::minutes(15 * i))
        .collect()
}

/// Duration until the next occurrence of `hour:00:00` UTC, strictly in
/// the future.
pub fn until_next_hour(now: DateTime<Utc>, hour: u32) -> Duration {
    let today = now
        .date_naive()
        .and_hms_opt(hour, 0, 0)
        .expect("configured hour is validated to 0-23")
        .and_utc();
    let next = if today > now {
        today
    } else {
        today + Days::new(1)
    };
    (next - now).to_std().unwrap_or(Duration::ZERO)
}
