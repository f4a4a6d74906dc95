//! Two-stage aggregation: per-file realtime snapshots and whole-day
//! rollups. Both rank collector bags to top-N, upsert the trend document,
//! and mirror the body into the cache; the store write is authoritative,
//! the cache write is best-effort.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::collect::Collector;
use crate::config::AppConfig;
use crate::error::NewstrendsError;
use crate::model::{Category, Keyword, Trend};
use crate::rank::rank_by_count;
use crate::storage::{TrendCache, TrendStore, cache_write, snapshot_key};

const DAILY_CACHE_TTL: u64 = 24 * 60 * 60;

#[derive(Clone)]
pub struct Aggregator {
    store: Arc<dyn TrendStore>,
    cache: Arc<dyn TrendCache>,
    top_n: usize,
    realtime_cache_ttl: u64,
}

impl Aggregator {
    pub fn new(store: Arc<dyn TrendStore>, cache: Arc<dyn TrendCache>, config: &AppConfig) -> Self {
        Self {
            store,
            cache,
            top_n: config.top_n,
            realtime_cache_ttl: config.realtime_cache_ttl(),
        }
    }

    /// Merge one fetched file's collector into `realtime` trends keyed on
    /// the file instant's date. `category` narrows the write to a single
    /// category; `None` writes all of them.
    pub async fn aggregate_from_file(
        &self,
        collector: &Collector,
        timestamp: DateTime<Utc>,
        category: Option<Category>,
    ) -> Result<(), NewstrendsError> {
        for cat in requested_entities(category) {
            let keywords = rank_by_count(bag_for(collector, cat).iter().map(String::as_str), self.top_n);
            let trend = Trend::realtime(timestamp, cat, keywords);
            self.persist(trend, self.realtime_cache_ttl).await?;
        }

        if wants_documents(category) && !collector.document_identifiers.is_empty() {
            let keywords = dedup_documents(&collector.document_identifiers, self.top_n);
            let trend = Trend::realtime(timestamp, Category::Documents, keywords);
            self.persist(trend, self.realtime_cache_ttl).await?;
        }

        debug!(
            date = %timestamp.date_naive(),
            rows = collector.rows,
            row_errors = collector.row_errors,
            "realtime aggregation complete"
        );
        Ok(())
    }

    /// Concatenate a day's collectors (one per 15-minute slot) and upsert
    /// `daily` trends for `date`.
    pub async fn aggregate_daily(
        &self,
        collectors: Vec<Collector>,
        date: NaiveDate,
        category: Option<Category>,
    ) -> Result<(), NewstrendsError> {
        let mut merged = Collector::new();
        for collector in collectors {
            merged.absorb(collector);
        }

        for cat in requested_entities(category) {
            let keywords = rank_by_count(bag_for(&merged, cat).iter().map(String::as_str), self.top_n);
            let trend = Trend::daily(date, cat, keywords);
            self.persist(trend, DAILY_CACHE_TTL).await?;
        }

        if wants_documents(category) && !merged.document_identifiers.is_empty() {
            let keywords = dedup_documents(&merged.document_identifiers, self.top_n);
            let trend = Trend::daily(date, Category::Documents, keywords);
            self.persist(trend, DAILY_CACHE_TTL).await?;
        }

        debug!(%date, rows = merged.rows, "daily aggregation complete");
        Ok(())
    }

    /// Store upsert and cache write run concurrently; only the store result
    /// can fail the operation.
    async fn persist(&self, trend: Trend, cache_ttl: u64) -> Result<(), NewstrendsError> {
        let key = snapshot_key(trend.trend_type, trend.date, trend.category.as_str());
        let (stored, ()) = tokio::join!(
            self.store.upsert_trend(&trend),
            cache_write(self.cache.as_ref(), &key, &trend, cache_ttl),
        );
        stored
    }
}

fn requested_entities(category: Option<Category>) -> Vec<Category> {
    match category {
        None => Category::ENTITIES.to_vec(),
        Some(Category::Documents) => Vec::new(),
        Some(cat) => vec![cat],
    }
}

fn wants_documents(category: Option<Category>) -> bool {
    matches!(category, None | Some(Category::Documents))
}

fn bag_for(collector: &Collector, category: Category) -> &[String] {
    match category {
        Category::Themes => &collector.themes,
        Category::Persons => &collector.persons,
        Category::Orgs => &collector.orgs,
        Category::Documents => &collector.document_identifiers,
    }
}

/// Collapse duplicate identifiers within a snapshot, first-seen order,
/// every entry count 1.
fn dedup_documents(ids: &[String], top_n: usize) -> Vec<Keyword> {
    let mut seen: HashSet<&str> = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .take(top_n)
        .map(|id| Keyword::new(id.clone(), 1))
        .collect()
}
