//! Fetch-and-process with the 15-minute → daily fallback ladder.
//!
//! A realtime job tries the quarter-hour artifact for its timestamp first;
//! any failure (network, HTTP status, archive, parse) drops it onto the
//! daily ladder: today's rollup, then yesterday's. Daily jobs start on the
//! ladder directly. Each rung is attempted independently and a success
//! persists under that rung's own date and job type.

use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveDate, Utc};
use tracing::{info, warn};

use crate::aggregate::Aggregator;
use crate::collect::{Collector, collect_records};
use crate::config::AppConfig;
use crate::error::NewstrendsError;
use crate::model::TrendType;

use super::client::GkgSource;
use super::decompress;
use super::urls::{daily_url, floor_to_quarter_hour, realtime_url};

/// Read timeout for single-artifact fetches.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(300);
/// Tighter per-file budget for the 96-slot daily rollup walk.
pub const DAILY_SLOT_TIMEOUT: Duration = Duration::from_secs(60);

/// How far the daily ladder reaches back from the requested date.
const LADDER_DAY_OFFSETS: [u64; 2] = [0, 1];

#[derive(Debug, Clone, Copy)]
pub struct FetchJob {
    pub job_type: TrendType,
    pub timestamp: Option<DateTime<Utc>>,
}

impl FetchJob {
    pub fn realtime(timestamp: DateTime<Utc>) -> Self {
        Self {
            job_type: TrendType::Realtime,
            timestamp: Some(timestamp),
        }
    }

    pub fn daily() -> Self {
        Self {
            job_type: TrendType::Daily,
            timestamp: None,
        }
    }
}

impl Default for FetchJob {
    fn default() -> Self {
        Self {
            job_type: TrendType::Realtime,
            timestamp: None,
        }
    }
}

/// Which rung of the ladder succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Realtime { timestamp: DateTime<Utc> },
    Daily { date: NaiveDate },
}

pub struct Fetcher {
    source: Arc<dyn GkgSource>,
    aggregator: Aggregator,
    config: Arc<AppConfig>,
}

impl Fetcher {
    pub fn new(source: Arc<dyn GkgSource>, aggregator: Aggregator, config: Arc<AppConfig>) -> Self {
        Self {
            source,
            aggregator,
            config,
        }
    }

    /// Locate, download, parse, and persist the best available artifact
    /// for `date`. Returns which rung succeeded, or an error once every
    /// rung has failed.
    pub async fn fetch_and_process(
        &self,
        date: NaiveDate,
        job: FetchJob,
    ) -> Result<FetchOutcome, NewstrendsError> {
        if job.job_type == TrendType::Realtime {
            let ts = floor_to_quarter_hour(job.timestamp.unwrap_or_else(Utc::now));
            match self.ingest_realtime(ts).await {
                Ok(()) => {
                    info!(timestamp = %ts, "realtime ingest complete");
                    return Ok(FetchOutcome::Realtime { timestamp: ts });
                }
                Err(e) => {
                    warn!(timestamp = %ts, error = %e, "realtime fetch failed, trying daily fallback");
                }
            }
        }

        for offset in LADDER_DAY_OFFSETS {
            let day = date - Days::new(offset);
            match self.ingest_daily(day).await {
                Ok(()) => {
                    info!(date = %day, "daily ingest complete");
                    return Ok(FetchOutcome::Daily { date: day });
                }
                Err(e) => {
                    warn!(date = %day, error = %e, "daily fetch failed");
                }
            }
        }

        Err(NewstrendsError::NoArtifact(date.to_string()))
    }

    /// Fetch and collect one 15-minute slot without persisting; the daily
    /// rollup walks a whole day this way before aggregating once.
    pub async fn collect_slot(
        &self,
        ts: DateTime<Utc>,
        timeout: Duration,
    ) -> Result<Collector, NewstrendsError> {
        let url = realtime_url(&self.config.gdelt_base_url, ts);
        self.collect_url(&url, timeout).await
    }

    async fn ingest_realtime(&self, ts: DateTime<Utc>) -> Result<(), NewstrendsError> {
        let url = realtime_url(&self.config.gdelt_base_url, ts);
        let collector = self.collect_url(&url, FETCH_TIMEOUT).await?;
        self.aggregator
            .aggregate_from_file(&collector, ts, None)
            .await
    }

    async fn ingest_daily(&self, date: NaiveDate) -> Result<(), NewstrendsError> {
        let url = daily_url(&self.config.gdelt_daily_base_url, date);
        let collector = self.collect_url(&url, FETCH_TIMEOUT).await?;
        self.aggregator
            .aggregate_daily(vec![collector], date, None)
            .await
    }

    /// Download into a scratch dir, extract the record file, stream-collect
    /// it. The scratch dir (and any partial download in it) is removed on
    /// every exit path when `dir` drops.
    async fn collect_url(&self, url: &str, timeout: Duration) -> Result<Collector, NewstrendsError> {
        let dir = tempfile::tempdir()?;
        let zip_path = dir.path().join("gkg.csv.zip");
        self.source.download(url, &zip_path, timeout).await?;
        let csv_path = decompress::extract_csv(&zip_path, dir.path())?;
        collect_file(&csv_path, &self.config)
    }
}

fn collect_file(csv_path: &Path, config: &AppConfig) -> Result<Collector, NewstrendsError> {
    let file = std::fs::File::open(csv_path)?;
    collect_records(BufReader::new(file), config.columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, TrendType};
    use crate::storage::{MemoryCache, MemoryStore, TrendQuery, TrendStore};
    use crate::testutil::{FixtureSource, gkg_row, gkg_zip};

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn harness(source: FixtureSource) -> (Arc<MemoryStore>, Fetcher) {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryCache::new());
        let config = Arc::new(AppConfig::default());
        let aggregator = Aggregator::new(store.clone(), cache, &config);
        let fetcher = Fetcher::new(Arc::new(source), aggregator, config);
        (store, fetcher)
    }

    fn sample_csv() -> String {
        format!(
            "{}\n",
            gkg_row("https://a.example/1", "ELECTION;PROTEST", "Jane Doe", "United Nations")
        )
    }

    #[tokio::test]
    async fn realtime_job_ingests_quarter_hour_artifact() {
        let mut source = FixtureSource::new();
        source.insert(
            "http://data.gdeltproject.org/gdeltv2/20240501081500.gkg.csv.zip",
            gkg_zip(&sample_csv()),
        );
        let (store, fetcher) = harness(source);

        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let outcome = fetcher
            .fetch_and_process(date, FetchJob::realtime(ts("2024-05-01T08:22:17Z")))
            .await
            .unwrap();

        // Timestamp is floored before the URL is built
        assert_eq!(
            outcome,
            FetchOutcome::Realtime {
                timestamp: ts("2024-05-01T08:15:00Z")
            }
        );
        let themes = store
            .find_trend(
                &TrendQuery::of(TrendType::Realtime)
                    .category(Category::Themes)
                    .on(date),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(themes.keywords.len(), 2);
    }

    #[tokio::test]
    async fn ladder_falls_back_to_yesterdays_daily() {
        // 15-minute artifact and today's daily both missing; only
        // yesterday's daily rollup exists.
        let mut source = FixtureSource::new();
        source.insert(
            "http://data.gdeltproject.org/gkg/20240430.gkg.csv.zip",
            gkg_zip(&sample_csv()),
        );
        let (store, fetcher) = harness(source);

        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2024, 4, 30).unwrap();
        let outcome = fetcher
            .fetch_and_process(date, FetchJob::realtime(ts("2024-05-01T08:22:17Z")))
            .await
            .unwrap();

        assert_eq!(outcome, FetchOutcome::Daily { date: yesterday });

        // The fallback persisted a daily trend keyed on yesterday and no
        // realtime trend at all.
        assert!(
            store
                .find_trends(&TrendQuery::of(TrendType::Realtime))
                .await
                .unwrap()
                .is_empty()
        );
        let daily = store
            .find_trend(
                &TrendQuery::of(TrendType::Daily)
                    .category(Category::Themes)
                    .on(yesterday),
            )
            .await
            .unwrap();
        assert!(daily.is_some());
    }

    #[tokio::test]
    async fn daily_job_skips_the_realtime_rung() {
        let mut source = FixtureSource::new();
        // Both artifacts exist; a daily job must not touch the 15-minute one.
        source.insert(
            "http://data.gdeltproject.org/gdeltv2/20240501000000.gkg.csv.zip",
            gkg_zip(&sample_csv()),
        );
        source.insert(
            "http://data.gdeltproject.org/gkg/20240501.gkg.csv.zip",
            gkg_zip(&sample_csv()),
        );
        let (store, fetcher) = harness(source);

        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let outcome = fetcher
            .fetch_and_process(date, FetchJob::daily())
            .await
            .unwrap();

        assert_eq!(outcome, FetchOutcome::Daily { date });
        assert!(
            store
                .find_trends(&TrendQuery::of(TrendType::Realtime))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn exhausted_ladder_is_an_error() {
        let (store, fetcher) = harness(FixtureSource::new());
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        let result = fetcher
            .fetch_and_process(date, FetchJob::realtime(ts("2024-05-01T08:22:17Z")))
            .await;

        assert!(result.is_err());
        assert!(store.is_empty());
    }
}
