//! Read-side HTTP surface. Handlers hit the cache first, fall back to the
//! store, and degrade cache failures to misses; only store failures turn
//! into error responses.

pub mod trends;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::fetch::Fetcher;
use crate::score::Scorer;
use crate::storage::{TrendCache, TrendStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TrendStore>,
    pub cache: Arc<dyn TrendCache>,
    pub fetcher: Arc<Fetcher>,
    pub scorer: Arc<Scorer>,
    pub config: Arc<AppConfig>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/trends/realtime", get(trends::realtime))
        .route("/trends/daily", get(trends::daily))
        .route("/trends/top", get(trends::top))
        .route("/trends/documents", get(trends::documents))
        .route("/trends/admin/fetchDaily", post(trends::fetch_daily))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
