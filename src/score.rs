//! Composite novelty/volume scoring over a sliding baseline window.
//!
//! Scoring runs in four phases: ensure the baseline days exist in the
//! store (backfilling through the fetcher), load the current day and its
//! baseline, score through three graceful-degradation tiers, and persist
//! the `ranked` document. The tiers exist because upstream data is noisy;
//! collapsing them into one strict pipeline would make whole days come
//! back empty.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::error::NewstrendsError;
use crate::fetch::{FetchJob, Fetcher};
use crate::model::{Category, Keyword, Trend, TrendType};
use crate::storage::{TrendQuery, TrendStore};
use crate::tokenize::{filter_noise, is_noise, is_numeric_vector};

/// Missing baseline days beyond this many are backfilled best-effort in
/// the background instead of blocking the request.
const MAX_AWAITED_BACKFILL: usize = 31;
/// In-flight fetch cap for both the awaited and background backfill.
const BACKFILL_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Copy)]
pub struct ScoreRequest {
    pub date: NaiveDate,
    pub category: Category,
    pub window_days: u32,
    pub top_n: usize,
}

impl ScoreRequest {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            category: Category::Themes,
            window_days: 7,
            top_n: 50,
        }
    }
}

pub struct Scorer {
    store: Arc<dyn TrendStore>,
    fetcher: Arc<Fetcher>,
}

impl Scorer {
    pub fn new(store: Arc<dyn TrendStore>, fetcher: Arc<Fetcher>) -> Self {
        Self { store, fetcher }
    }

    /// Compute the ranked keyword list for a day and persist it. Returns
    /// an empty list (and writes nothing) when the day has no usable
    /// daily document.
    pub async fn score_trends(
        &self,
        request: ScoreRequest,
    ) -> Result<Vec<Keyword>, NewstrendsError> {
        self.ensure_baseline(request.date, request.window_days)
            .await?;

        // Phase B: current day plus the window preceding it.
        let current = self
            .store
            .find_trend(
                &TrendQuery::of(TrendType::Daily)
                    .category(request.category)
                    .on(request.date),
            )
            .await?;
        let Some(current) = current else {
            debug!(date = %request.date, category = %request.category, "no daily document to score");
            return Ok(Vec::new());
        };
        if current.keywords.is_empty() {
            return Ok(Vec::new());
        }

        let window_start = request.date - Days::new(u64::from(request.window_days));
        let baseline: Vec<Keyword> = self
            .store
            .find_trends(
                &TrendQuery::of(TrendType::Daily)
                    .category(request.category)
                    .within(window_start, request.date),
            )
            .await?
            .into_iter()
            .flat_map(|t| t.keywords)
            .collect();

        let ranked = score_tiers(
            current.keywords,
            baseline,
            request.window_days,
            request.top_n,
        );
        if ranked.is_empty() {
            return Ok(Vec::new());
        }

        // Phase D: persist and hand the same list back.
        let trend = Trend::ranked(request.date, request.category, ranked.clone());
        self.store.upsert_trend(&trend).await?;
        Ok(ranked)
    }

    /// Phase A: make sure every day of `{date} ∪ (date-window, date]` has
    /// a daily document. The first [`MAX_AWAITED_BACKFILL`] missing days
    /// are fetched now (bounded fan-out) so short analyst windows complete
    /// synchronously; anything beyond that is backfilled by a detached
    /// task so long windows degrade to best-effort instead of blocking.
    async fn ensure_baseline(
        &self,
        date: NaiveDate,
        window_days: u32,
    ) -> Result<(), NewstrendsError> {
        let wanted: Vec<NaiveDate> = (0..=u64::from(window_days))
            .map(|offset| date - Days::new(offset))
            .collect();

        let present: HashSet<NaiveDate> = self
            .store
            .find_trends(&TrendQuery::of(TrendType::Daily).among(wanted.clone()))
            .await?
            .into_iter()
            .map(|t| t.date)
            .collect();

        let missing: Vec<NaiveDate> = wanted
            .into_iter()
            .filter(|d| !present.contains(d))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        debug!(date = %date, missing = missing.len(), "backfilling baseline days");

        let awaited_len = missing.len().min(MAX_AWAITED_BACKFILL);
        let (awaited, background) = missing.split_at(awaited_len);

        futures_util::stream::iter(awaited.to_vec())
            .for_each_concurrent(BACKFILL_CONCURRENCY, |day| {
                let fetcher = Arc::clone(&self.fetcher);
                async move {
                    if let Err(e) = fetcher.fetch_and_process(day, FetchJob::daily()).await {
                        warn!(date = %day, error = %e, "baseline backfill failed");
                    }
                }
            })
            .await;

        if !background.is_empty() {
            let fetcher = Arc::clone(&self.fetcher);
            let days = background.to_vec();
            tokio::spawn(async move {
                futures_util::stream::iter(days)
                    .for_each_concurrent(BACKFILL_CONCURRENCY, |day| {
                        let fetcher = Arc::clone(&fetcher);
                        async move {
                            if let Err(e) = fetcher.fetch_and_process(day, FetchJob::daily()).await
                            {
                                debug!(date = %day, error = %e, "background backfill failed");
                            }
                        }
                    })
                    .await;
            });
        }

        Ok(())
    }
}

/// Three scoring tiers, first non-empty result wins.
fn score_tiers(
    current: Vec<Keyword>,
    baseline: Vec<Keyword>,
    window_days: u32,
    top_n: usize,
) -> Vec<Keyword> {
    // Strict: noise filtered from both sides.
    let strict = score_core(
        filter_noise(current.clone()),
        &baseline_totals(filter_noise(baseline.clone())),
        window_days,
        top_n,
    );
    if !strict.is_empty() {
        return strict;
    }

    // Loose: drop only numeric vectors. Persisted daily documents may
    // carry noise from older ingests; scoring them beats returning nothing.
    let loose_current: Vec<Keyword> = current
        .iter()
        .filter(|k| !is_numeric_vector(&k.word))
        .cloned()
        .collect();
    let loose_baseline: Vec<Keyword> = baseline
        .into_iter()
        .filter(|k| !is_numeric_vector(&k.word))
        .collect();
    let loose = score_core(
        loose_current,
        &baseline_totals(loose_baseline),
        window_days,
        top_n,
    );
    if !loose.is_empty() {
        return loose;
    }

    // Volume-only: raw counts, flat score.
    let mut fallback: Vec<Keyword> = current.into_iter().filter(|k| !is_noise(&k.word)).collect();
    fallback.sort_by(|a, b| b.count.cmp(&a.count));
    fallback.truncate(top_n);
    fallback
        .into_iter()
        .map(|k| Keyword::scored(k.word, k.count, 100))
        .collect()
}

/// Total occurrences per word across the baseline window.
fn baseline_totals(keywords: Vec<Keyword>) -> HashMap<String, u64> {
    let mut totals: HashMap<String, u64> = HashMap::new();
    for kw in keywords {
        *totals.entry(kw.word).or_insert(0) += kw.count;
    }
    totals
}

/// Composite score: `0.6·ln(1+count) + 0.3·ln(1+growth) + 0.1·max(0, z)`,
/// linearly normalized so the maximum lands on exactly 100. `growth`
/// compares today's count against the per-day baseline average; `z` is
/// today's count against the population distribution of baseline totals.
fn score_core(
    current: Vec<Keyword>,
    baseline: &HashMap<String, u64>,
    window_days: u32,
    top_n: usize,
) -> Vec<Keyword> {
    if current.is_empty() {
        return Vec::new();
    }

    let values: Vec<f64> = if baseline.is_empty() {
        vec![0.0]
    } else {
        baseline.values().map(|&v| v as f64).collect()
    };
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    let stddev = variance.sqrt();
    let window = f64::from(window_days.max(1));

    let raw: Vec<(Keyword, f64)> = current
        .into_iter()
        .map(|kw| {
            let count = kw.count as f64;
            let base = baseline.get(&kw.word).copied().unwrap_or(0) as f64;
            let volume = (1.0 + count).ln();
            let growth = (count + 1.0) / (base / window + 1.0);
            let z = if stddev > 0.0 { (count - mean) / stddev } else { 0.0 };
            let score = 0.6 * volume + 0.3 * (1.0 + growth).ln() + 0.1 * z.max(0.0);
            (kw, score)
        })
        .collect();

    let max = raw.iter().map(|(_, s)| *s).fold(f64::NEG_INFINITY, f64::max);
    let mut scored: Vec<Keyword> = raw
        .into_iter()
        .map(|(kw, s)| {
            let normalized = if max > 0.0 {
                (s / max * 100.0).round() as u32
            } else {
                0
            };
            Keyword::scored(kw.word, kw.count, normalized)
        })
        .collect();

    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(top_n);
    scored
}
