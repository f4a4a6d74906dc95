//! Postgres adapter: one `trends` table keyed `(trend_type, date, category)`
//! with a JSONB keyword body. Upserts go through `ON CONFLICT ... DO
//! UPDATE`, which gives the atomic whole-body replacement the contract
//! requires.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{FromRow, Postgres, QueryBuilder};

use crate::error::NewstrendsError;
use crate::model::{Category, Keyword, Trend, TrendType};

use super::{DateFilter, TrendQuery, TrendStore};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS trends (
    trend_type  TEXT        NOT NULL,
    date        DATE        NOT NULL,
    category    TEXT        NOT NULL,
    timestamp   TIMESTAMPTZ NOT NULL,
    keywords    JSONB       NOT NULL,
    PRIMARY KEY (trend_type, date, category)
)
"#;

pub struct PgTrendStore {
    pool: PgPool,
}

impl PgTrendStore {
    /// Connect and ensure the schema exists. Called once at startup;
    /// failure here is fatal.
    pub async fn connect(database_url: &str) -> Result<Self, NewstrendsError> {
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(database_url)
            .await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }
}

#[derive(FromRow)]
struct TrendRow {
    trend_type: String,
    date: NaiveDate,
    category: String,
    timestamp: DateTime<Utc>,
    keywords: Json<Vec<Keyword>>,
}

impl TryFrom<TrendRow> for Trend {
    type Error = NewstrendsError;

    fn try_from(row: TrendRow) -> Result<Self, Self::Error> {
        Ok(Trend {
            trend_type: row.trend_type.parse::<TrendType>()?,
            date: row.date,
            category: row.category.parse::<Category>()?,
            timestamp: row.timestamp,
            keywords: row.keywords.0,
        })
    }
}

fn build_select(query: &TrendQuery) -> QueryBuilder<'_, Postgres> {
    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT trend_type, date, category, timestamp, keywords FROM trends WHERE trend_type = ");
    qb.push_bind(query.trend_type.as_str());

    if let Some(category) = query.category {
        qb.push(" AND category = ");
        qb.push_bind(category.as_str());
    }
    match &query.dates {
        DateFilter::Any => {}
        DateFilter::On(date) => {
            qb.push(" AND date = ");
            qb.push_bind(*date);
        }
        DateFilter::Among(dates) => {
            qb.push(" AND date = ANY(");
            qb.push_bind(dates.clone());
            qb.push(")");
        }
        DateFilter::Range { from, until } => {
            qb.push(" AND date >= ");
            qb.push_bind(*from);
            qb.push(" AND date < ");
            qb.push_bind(*until);
        }
    }

    if query.newest_first {
        qb.push(" ORDER BY timestamp DESC");
    } else {
        qb.push(" ORDER BY date ASC, category ASC");
    }
    if let Some(limit) = query.limit {
        qb.push(" LIMIT ");
        qb.push_bind(limit as i64);
    }
    qb
}

#[async_trait]
impl TrendStore for PgTrendStore {
    async fn upsert_trend(&self, trend: &Trend) -> Result<(), NewstrendsError> {
        sqlx::query(
            r#"
            INSERT INTO trends (trend_type, date, category, timestamp, keywords)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (trend_type, date, category)
            DO UPDATE SET timestamp = EXCLUDED.timestamp, keywords = EXCLUDED.keywords
            "#,
        )
        .bind(trend.trend_type.as_str())
        .bind(trend.date)
        .bind(trend.category.as_str())
        .bind(trend.timestamp)
        .bind(Json(&trend.keywords))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_trend(&self, query: &TrendQuery) -> Result<Option<Trend>, NewstrendsError> {
        let mut qb = build_select(query);
        let row: Option<TrendRow> = qb.build_query_as().fetch_optional(&self.pool).await?;
        row.map(Trend::try_from).transpose()
    }

    async fn find_trends(&self, query: &TrendQuery) -> Result<Vec<Trend>, NewstrendsError> {
        let mut qb = build_select(query);
        let rows: Vec<TrendRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(Trend::try_from).collect()
    }
}
