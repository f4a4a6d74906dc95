//! Store and cache contracts, plus the adapters that implement them.
//!
//! The pipeline only ever talks to [`TrendStore`] and [`TrendCache`];
//! Postgres and Redis are the production adapters, the in-memory pair backs
//! tests and the `--memory` dev mode. Cache failures are never surfaced to
//! callers — the helpers here degrade them to misses with a warning.

pub mod memory;
pub mod postgres;
pub mod redis;

pub use self::memory::{MemoryCache, MemoryStore};
pub use self::postgres::PgTrendStore;
pub use self::redis::RedisCache;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::NewstrendsError;
use crate::model::{Category, Trend, TrendType};

/// Date predicates used by the read paths.
#[derive(Debug, Clone)]
pub enum DateFilter {
    Any,
    On(NaiveDate),
    Among(Vec<NaiveDate>),
    /// Half-open range: `from <= date < until`.
    Range { from: NaiveDate, until: NaiveDate },
}

/// Query over persisted trends. Built with the fluent helpers below.
#[derive(Debug, Clone)]
pub struct TrendQuery {
    pub trend_type: TrendType,
    pub category: Option<Category>,
    pub dates: DateFilter,
    pub newest_first: bool,
    pub limit: Option<usize>,
}

impl TrendQuery {
    pub fn of(trend_type: TrendType) -> Self {
        Self {
            trend_type,
            category: None,
            dates: DateFilter::Any,
            newest_first: false,
            limit: None,
        }
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.dates = DateFilter::On(date);
        self
    }

    pub fn among(mut self, dates: Vec<NaiveDate>) -> Self {
        self.dates = DateFilter::Among(dates);
        self
    }

    pub fn within(mut self, from: NaiveDate, until: NaiveDate) -> Self {
        self.dates = DateFilter::Range { from, until };
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a trend's key fields satisfy this query.
    pub fn matches(&self, trend: &Trend) -> bool {
        if trend.trend_type != self.trend_type {
            return false;
        }
        if let Some(cat) = self.category
            && trend.category != cat
        {
            return false;
        }
        match &self.dates {
            DateFilter::Any => true,
            DateFilter::On(d) => trend.date == *d,
            DateFilter::Among(ds) => ds.contains(&trend.date),
            DateFilter::Range { from, until } => trend.date >= *from && trend.date < *until,
        }
    }
}

/// Persistent trend document store. Upserts are atomic on the
/// `(type, date, category)` key and replace the whole body; concurrent
/// writers are last-writer-wins.
#[async_trait]
pub trait TrendStore: Send + Sync {
    async fn upsert_trend(&self, trend: &Trend) -> Result<(), NewstrendsError>;
    async fn find_trend(&self, query: &TrendQuery) -> Result<Option<Trend>, NewstrendsError>;
    async fn find_trends(&self, query: &TrendQuery) -> Result<Vec<Trend>, NewstrendsError>;
}

/// TTL key-value cache over opaque serialized bodies. Expiry is
/// best-effort.
#[async_trait]
pub trait TrendCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, NewstrendsError>;
    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> Result<(), NewstrendsError>;
    async fn del(&self, key: &str) -> Result<(), NewstrendsError>;
}

/// Key for a per-category snapshot body: `realtime:<date>:<cat>` or
/// `daily:<date>:<cat>`. The `all` pseudo-category caches the assembled
/// multi-category read.
pub fn snapshot_key(trend_type: TrendType, date: NaiveDate, category: &str) -> String {
    format!("{trend_type}:{date}:{category}")
}

/// Key for a cached scorer response.
pub fn top_key(date: NaiveDate, category: Category, window_days: u32, limit: usize) -> String {
    format!("top:{date}:{category}:{window_days}:{limit}")
}

/// Read-through helper: any cache or decode failure is logged and treated
/// as a miss.
pub async fn cache_read<T: DeserializeOwned>(cache: &dyn TrendCache, key: &str) -> Option<T> {
    match cache.get(key).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "cached value failed to decode, treating as miss");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!(key, error = %e, "cache read failed, treating as miss");
            None
        }
    }
}

/// Write-behind helper: failures are logged and swallowed; the request
/// never fails because the cache did.
pub async fn cache_write<T: Serialize>(cache: &dyn TrendCache, key: &str, value: &T, ttl: u64) {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(key, error = %e, "value failed to serialize for cache");
            return;
        }
    };
    if let Err(e) = cache.set_with_ttl(key, &raw, ttl).await {
        warn!(key, error = %e, "cache write failed");
    }
}

pub async fn cache_evict(cache: &dyn TrendCache, key: &str) {
    if let Err(e) = cache.del(key).await {
        warn!(key, error = %e, "cache eviction failed");
    }
}
