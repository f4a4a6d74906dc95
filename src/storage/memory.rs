//! In-memory store and cache, shared by the test suite and the `--memory`
//! dev mode. Semantics mirror the production adapters: whole-body upserts
//! keyed `(type, date, category)`, best-effort TTL expiry on the cache.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::NewstrendsError;
use crate::model::{Category, Trend, TrendType};

use super::{TrendCache, TrendQuery, TrendStore};

type TrendKey = (TrendType, NaiveDate, Category);

#[derive(Default)]
pub struct MemoryStore {
    trends: Mutex<HashMap<TrendKey, Trend>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted documents; test-suite convenience.
    pub fn len(&self) -> usize {
        self.trends.lock().expect("store lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TrendStore for MemoryStore {
    async fn upsert_trend(&self, trend: &Trend) -> Result<(), NewstrendsError> {
        let key = (trend.trend_type, trend.date, trend.category);
        self.trends
            .lock()
            .expect("store lock")
            .insert(key, trend.clone());
        Ok(())
    }

    async fn find_trend(&self, query: &TrendQuery) -> Result<Option<Trend>, NewstrendsError> {
        Ok(self.find_trends(query).await?.into_iter().next())
    }

    async fn find_trends(&self, query: &TrendQuery) -> Result<Vec<Trend>, NewstrendsError> {
        let trends = self.trends.lock().expect("store lock");
        let mut found: Vec<Trend> = trends
            .values()
            .filter(|t| query.matches(t))
            .cloned()
            .collect();
        if query.newest_first {
            found.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        } else {
            found.sort_by(|a, b| (a.date, a.category.as_str()).cmp(&(b.date, b.category.as_str())));
        }
        if let Some(limit) = query.limit {
            found.truncate(limit);
        }
        Ok(found)
    }
}

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TrendCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, NewstrendsError> {
        let mut entries = self.entries.lock().expect("cache lock");
        match entries.get(key) {
            Some((value, expires)) if *expires > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> Result<(), NewstrendsError> {
        let expires = Instant::now() + Duration::from_secs(ttl_seconds);
        self.entries
            .lock()
            .expect("cache lock")
            .insert(key.to_string(), (value.to_string(), expires));
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), NewstrendsError> {
        self.entries.lock().expect("cache lock").remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Keyword;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[tokio::test]
    async fn upsert_replaces_whole_body() {
        let store = MemoryStore::new();
        let first = Trend::daily(day(1), Category::Themes, vec![Keyword::new("old", 1)]);
        let second = Trend::daily(day(1), Category::Themes, vec![Keyword::new("new", 9)]);

        store.upsert_trend(&first).await.unwrap();
        store.upsert_trend(&second).await.unwrap();

        assert_eq!(store.len(), 1);
        let got = store
            .find_trend(&TrendQuery::of(TrendType::Daily).on(day(1)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got.keywords.len(), 1);
        assert_eq!(got.keywords[0].word, "new");
    }

    #[tokio::test]
    async fn find_trends_filters_by_date_set() {
        let store = MemoryStore::new();
        for d in 1..=5 {
            store
                .upsert_trend(&Trend::daily(day(d), Category::Themes, vec![]))
                .await
                .unwrap();
        }
        let found = store
            .find_trends(
                &TrendQuery::of(TrendType::Daily)
                    .category(Category::Themes)
                    .among(vec![day(2), day(4), day(9)]),
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].date, day(2));
        assert_eq!(found[1].date, day(4));
    }

    #[tokio::test]
    async fn newest_first_orders_by_timestamp_and_limits() {
        let store = MemoryStore::new();
        for d in 1..=4 {
            store
                .upsert_trend(&Trend::daily(day(d), Category::Themes, vec![]))
                .await
                .unwrap();
        }
        let found = store
            .find_trends(&TrendQuery::of(TrendType::Daily).newest_first().limit(2))
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].date, day(4));
        assert_eq!(found[1].date, day(3));
    }

    #[tokio::test]
    async fn cache_roundtrip_and_delete() {
        let cache = MemoryCache::new();
        cache.set_with_ttl("k", "v", 60).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));
        cache.del("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn cache_expires_entries() {
        let cache = MemoryCache::new();
        cache.set_with_ttl("k", "v", 0).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }
}
