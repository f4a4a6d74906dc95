use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::error::NewstrendsError;
use crate::fetch::FetchJob;
use crate::model::{Category, Keyword, Trend, TrendType};
use crate::score::ScoreRequest;
use crate::storage::{
    TrendQuery, cache_evict, cache_read, cache_write, snapshot_key, top_key,
};

use super::AppState;

/// Realtime snapshots returned per read, regardless of category fan-out.
const REALTIME_READ_LIMIT: usize = 20;
const DAILY_CACHE_TTL: u64 = 24 * 60 * 60;
const TOP_CACHE_TTL: u64 = 600;

#[derive(Debug)]
pub struct ApiError(NewstrendsError);

impl<E: Into<NewstrendsError>> From<E> for ApiError {
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            NewstrendsError::InvalidDate(_) | NewstrendsError::Config(_) => {
                StatusCode::BAD_REQUEST
            }
            NewstrendsError::NoArtifact(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

/// The envelope every read endpoint returns.
#[derive(Debug, Serialize)]
pub struct TrendsResponse {
    pub date: NaiveDate,
    pub category: String,
    pub results: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct TrendParams {
    pub date: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopParams {
    pub date: Option<String>,
    pub category: Option<String>,
    pub window: Option<String>,
    pub limit: Option<usize>,
    pub nocache: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct DateParams {
    pub date: Option<String>,
}

/// `GET /trends/realtime?date&category` — most recent realtime snapshots,
/// newest first.
pub async fn realtime(
    State(state): State<AppState>,
    Query(params): Query<TrendParams>,
) -> Result<Json<TrendsResponse>, ApiError> {
    let date = parse_date(params.date.as_deref())?;
    let category = parse_category(params.category.as_deref())?;
    let label = category_label(category);
    let key = snapshot_key(TrendType::Realtime, date, label);
    let ttl = state.config.realtime_cache_ttl();

    // Per-category keys hold the single trend body the aggregator writes;
    // only the assembled `all` read gets its own list-shaped key.
    if let Some(cat) = category {
        if let Some(trend) = cache_read::<Trend>(state.cache.as_ref(), &key).await {
            return Ok(Json(envelope(date, label, &vec![trend])?));
        }
        let results = state
            .store
            .find_trends(
                &TrendQuery::of(TrendType::Realtime)
                    .category(cat)
                    .on(date)
                    .newest_first()
                    .limit(REALTIME_READ_LIMIT),
            )
            .await?;
        if let Some(trend) = results.first() {
            cache_write(state.cache.as_ref(), &key, trend, ttl).await;
        }
        return Ok(Json(envelope(date, label, &results)?));
    }

    if let Some(results) = cache_read::<Vec<Trend>>(state.cache.as_ref(), &key).await {
        return Ok(Json(envelope(date, label, &results)?));
    }
    let results = state
        .store
        .find_trends(
            &TrendQuery::of(TrendType::Realtime)
                .on(date)
                .newest_first()
                .limit(REALTIME_READ_LIMIT),
        )
        .await?;
    if !results.is_empty() {
        cache_write(state.cache.as_ref(), &key, &results, ttl).await;
    }
    Ok(Json(envelope(date, label, &results)?))
}

/// `GET /trends/daily?date&category` — one rollup document, or all four
/// when `category=all`.
pub async fn daily(
    State(state): State<AppState>,
    Query(params): Query<TrendParams>,
) -> Result<Json<TrendsResponse>, ApiError> {
    let date = parse_date(params.date.as_deref())?;
    let category = parse_category(params.category.as_deref())?;
    let label = category_label(category);
    let key = snapshot_key(TrendType::Daily, date, label);

    match category {
        Some(cat) => {
            if let Some(trend) = cache_read::<Trend>(state.cache.as_ref(), &key).await {
                return Ok(Json(envelope(date, label, &trend)?));
            }
            let trend = state
                .store
                .find_trend(&TrendQuery::of(TrendType::Daily).category(cat).on(date))
                .await?;
            if let Some(ref trend) = trend {
                cache_write(state.cache.as_ref(), &key, trend, DAILY_CACHE_TTL).await;
            }
            Ok(Json(envelope(date, label, &trend)?))
        }
        None => {
            if let Some(trends) = cache_read::<Vec<Trend>>(state.cache.as_ref(), &key).await {
                return Ok(Json(envelope(date, label, &trends)?));
            }
            let trends = state
                .store
                .find_trends(&TrendQuery::of(TrendType::Daily).on(date))
                .await?;
            if !trends.is_empty() {
                cache_write(state.cache.as_ref(), &key, &trends, DAILY_CACHE_TTL).await;
            }
            Ok(Json(envelope(date, label, &trends)?))
        }
    }
}

/// `GET /trends/top?date&category&window&limit&nocache` — ranked keywords
/// from the scorer, cached briefly.
pub async fn top(
    State(state): State<AppState>,
    Query(params): Query<TopParams>,
) -> Result<Json<TrendsResponse>, ApiError> {
    let date = parse_date(params.date.as_deref())?;
    let category = match params.category.as_deref() {
        None => Category::Themes,
        Some(raw) => raw.parse::<Category>()?,
    };
    let window_days = params.window.as_deref().map(parse_window).unwrap_or(7);
    let limit = params.limit.unwrap_or(state.config.top_n);
    let bypass_cache = params.nocache == Some(1);

    let key = top_key(date, category, window_days, limit);
    if !bypass_cache
        && let Some(results) = cache_read::<Vec<Keyword>>(state.cache.as_ref(), &key).await
    {
        return Ok(Json(envelope(date, category.as_str(), &results)?));
    }

    let mut request = ScoreRequest::new(date);
    request.category = category;
    request.window_days = window_days;
    request.top_n = limit;
    let results = state.scorer.score_trends(request).await?;

    cache_write(state.cache.as_ref(), &key, &results, TOP_CACHE_TTL).await;
    Ok(Json(envelope(date, category.as_str(), &results)?))
}

/// `GET /trends/documents?date` — the unique document identifiers of the
/// date's daily rollup.
pub async fn documents(
    State(state): State<AppState>,
    Query(params): Query<DateParams>,
) -> Result<Json<TrendsResponse>, ApiError> {
    let date = parse_date(params.date.as_deref())?;
    let key = snapshot_key(TrendType::Daily, date, Category::Documents.as_str());

    let trend = match cache_read::<Trend>(state.cache.as_ref(), &key).await {
        Some(trend) => Some(trend),
        None => {
            let trend = state
                .store
                .find_trend(
                    &TrendQuery::of(TrendType::Daily)
                        .category(Category::Documents)
                        .on(date),
                )
                .await?;
            if let Some(ref trend) = trend {
                cache_write(state.cache.as_ref(), &key, trend, DAILY_CACHE_TTL).await;
            }
            trend
        }
    };

    let ids: Vec<String> = trend
        .map(|t| t.keywords.into_iter().map(|k| k.word).collect())
        .unwrap_or_default();
    Ok(Json(envelope(date, Category::Documents.as_str(), &ids)?))
}

/// `POST /trends/admin/fetchDaily?date` — force a daily re-ingest and
/// evict the day's cached reads.
pub async fn fetch_daily(
    State(state): State<AppState>,
    Query(params): Query<DateParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let raw = params
        .date
        .ok_or_else(|| NewstrendsError::InvalidDate("date parameter is required".to_string()))?;
    let date = parse_date(Some(&raw))?;

    info!(%date, "admin daily re-ingest requested");
    let outcome = state
        .fetcher
        .fetch_and_process(date, FetchJob::daily())
        .await?;

    for label in ["all", "themes", "persons", "orgs", "documents"] {
        let key = snapshot_key(TrendType::Daily, date, label);
        cache_evict(state.cache.as_ref(), &key).await;
    }

    Ok(Json(json!({ "date": date, "status": "ok", "outcome": format!("{outcome:?}") })))
}

fn envelope<T: Serialize>(
    date: NaiveDate,
    category: &str,
    results: &T,
) -> Result<TrendsResponse, ApiError> {
    Ok(TrendsResponse {
        date,
        category: category.to_string(),
        results: serde_json::to_value(results).map_err(NewstrendsError::from)?,
    })
}

fn parse_date(raw: Option<&str>) -> Result<NaiveDate, ApiError> {
    match raw {
        None => Ok(Utc::now().date_naive()),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| NewstrendsError::InvalidDate(raw.to_string()).into()),
    }
}

/// `None` means all categories.
fn parse_category(raw: Option<&str>) -> Result<Option<Category>, ApiError> {
    match raw {
        None | Some("all") => Ok(None),
        Some(raw) => Ok(Some(raw.parse::<Category>()?)),
    }
}

fn category_label(category: Option<Category>) -> &'static str {
    category.map(|c| c.as_str()).unwrap_or("all")
}

/// Window grammar: bare integer → days; `Nd`/`Nm`/`Ny` → days, months
/// (30 d), years (365 d); anything unparseable → 7.
pub fn parse_window(raw: &str) -> u32 {
    if raw.is_ascii()
        && let Ok(days) = raw.parse::<u32>()
    {
        return days;
    }
    if raw.is_ascii() && raw.len() >= 2 {
        let (num, suffix) = raw.split_at(raw.len() - 1);
        if let Ok(n) = num.parse::<u32>() {
            match suffix {
                "d" => return n,
                "m" => return n * 30,
                "y" => return n * 365,
                _ => {}
            }
        }
    }
    7
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregator;
    use crate::config::AppConfig;
    use crate::fetch::Fetcher;
    use crate::model::Trend;
    use crate::score::Scorer;
    use crate::storage::{MemoryCache, MemoryStore, TrendStore};
    use crate::testutil::FixtureSource;
    use std::sync::Arc;

    #[test]
    fn window_grammar() {
        assert_eq!(parse_window("7d"), 7);
        assert_eq!(parse_window("30d"), 30);
        assert_eq!(parse_window("3m"), 90);
        assert_eq!(parse_window("1y"), 365);
        assert_eq!(parse_window("3y"), 1095);
        assert_eq!(parse_window("14"), 14);
        assert_eq!(parse_window("2w"), 7);
        assert_eq!(parse_window("banana"), 7);
        assert_eq!(parse_window(""), 7);
    }

    #[test]
    fn category_parsing() {
        assert_eq!(parse_category(None).unwrap(), None);
        assert_eq!(parse_category(Some("all")).unwrap(), None);
        assert_eq!(
            parse_category(Some("themes")).unwrap(),
            Some(Category::Themes)
        );
        assert!(parse_category(Some("bogus")).is_err());
    }

    #[test]
    fn date_parsing() {
        assert_eq!(
            parse_date(Some("2024-05-01")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
        );
        assert!(parse_date(Some("05/01/2024")).is_err());
    }

    fn state() -> (Arc<MemoryStore>, AppState) {
        let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryCache::new());
        let config = Arc::new(AppConfig::default());
        let aggregator = Aggregator::new(store.clone(), cache.clone(), &config);
        let fetcher = Arc::new(Fetcher::new(
            Arc::new(FixtureSource::new()),
            aggregator,
            Arc::clone(&config),
        ));
        let scorer = Arc::new(Scorer::new(store.clone(), Arc::clone(&fetcher)));
        let state = AppState {
            store: store.clone(),
            cache,
            fetcher,
            scorer,
            config,
        };
        (store, state)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[tokio::test]
    async fn daily_endpoint_returns_single_category_document() {
        let (store, state) = state();
        store
            .upsert_trend(&Trend::daily(
                date(),
                Category::Themes,
                vec![Keyword::new("election", 4)],
            ))
            .await
            .unwrap();

        let response = daily(
            State(state),
            Query(TrendParams {
                date: Some("2024-05-01".to_string()),
                category: Some("themes".to_string()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.0.category, "themes");
        assert_eq!(response.0.results["keywords"][0]["word"], "election");
    }

    #[tokio::test]
    async fn daily_endpoint_lists_all_categories() {
        let (store, state) = state();
        for cat in [Category::Themes, Category::Persons] {
            store
                .upsert_trend(&Trend::daily(date(), cat, vec![Keyword::new("k", 1)]))
                .await
                .unwrap();
        }

        let response = daily(
            State(state),
            Query(TrendParams {
                date: Some("2024-05-01".to_string()),
                category: None,
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.0.category, "all");
        assert_eq!(response.0.results.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn documents_endpoint_flattens_identifiers() {
        let (store, state) = state();
        store
            .upsert_trend(&Trend::daily(
                date(),
                Category::Documents,
                vec![
                    Keyword::new("https://a.example/1", 1),
                    Keyword::new("https://b.example/2", 1),
                ],
            ))
            .await
            .unwrap();

        let response = documents(
            State(state),
            Query(DateParams {
                date: Some("2024-05-01".to_string()),
            }),
        )
        .await
        .unwrap();

        let ids = response.0.results.as_array().unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], "https://a.example/1");
    }

    #[tokio::test]
    async fn top_endpoint_scores_and_caches() {
        let (store, state) = state();
        store
            .upsert_trend(&Trend::daily(
                date(),
                Category::Themes,
                vec![Keyword::new("surge", 40), Keyword::new("steady", 10)],
            ))
            .await
            .unwrap();

        let params = || TopParams {
            date: Some("2024-05-01".to_string()),
            category: Some("themes".to_string()),
            window: Some("7d".to_string()),
            limit: Some(10),
            nocache: None,
        };

        let response = top(State(state.clone()), Query(params())).await.unwrap();
        let results = response.0.results.as_array().unwrap();
        assert_eq!(results[0]["word"], "surge");
        assert_eq!(results[0]["score"], 100);

        // Second read comes from the cache
        let cached: Option<Vec<Keyword>> =
            cache_read(state.cache.as_ref(), "top:2024-05-01:themes:7:10").await;
        assert!(cached.is_some());
    }

    #[tokio::test]
    async fn realtime_endpoint_serves_the_aggregator_cached_body() {
        let (_store, state) = state();
        let ts: chrono::DateTime<Utc> = "2024-05-01T08:15:00Z".parse().unwrap();
        let trend = Trend::realtime(ts, Category::Themes, vec![Keyword::new("election", 2)]);
        cache_write(state.cache.as_ref(), "realtime:2024-05-01:themes", &trend, 60).await;

        let response = realtime(
            State(state),
            Query(TrendParams {
                date: Some("2024-05-01".to_string()),
                category: Some("themes".to_string()),
            }),
        )
        .await
        .unwrap();

        let results = response.0.results.as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["keywords"][0]["word"], "election");
    }

    #[tokio::test]
    async fn realtime_endpoint_empty_day_is_empty_list() {
        let (_store, state) = state();
        let response = realtime(
            State(state),
            Query(TrendParams {
                date: Some("2024-05-01".to_string()),
                category: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.0.results.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn admin_fetch_daily_requires_date() {
        let (_store, state) = state();
        assert!(
            fetch_daily(State(state), Query(DateParams { date: None }))
                .await
                .is_err()
        );
    }
}
