//! Process configuration, read once from the environment at startup.
//! Steady-state code never touches the environment; everything threads
//! through an [`AppConfig`].

use std::fmt::Display;
use std::str::FromStr;

use crate::collect::ColumnLayout;
use crate::error::NewstrendsError;

pub const DEFAULT_GDELT_BASE_URL: &str = "http://data.gdeltproject.org/gdeltv2";
pub const DEFAULT_GDELT_DAILY_BASE_URL: &str = "http://data.gdeltproject.org/gkg";

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
        }
    }
}

impl RedisConfig {
    pub fn url(&self) -> String {
        match &self.password {
            Some(password) => format!("redis://:{password}@{}:{}/", self.host, self.port),
            None => format!("redis://{}:{}/", self.host, self.port),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres DSN. Optional so the in-memory dev mode can run without a
    /// database; commands that need the store fail fast when it is unset.
    pub database_url: Option<String>,
    pub redis: RedisConfig,
    pub gdelt_base_url: String,
    pub gdelt_daily_base_url: String,
    pub realtime_interval_min: u64,
    pub daily_hour_utc: u32,
    pub top_n: usize,
    pub port: u16,
    pub columns: ColumnLayout,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            redis: RedisConfig::default(),
            gdelt_base_url: DEFAULT_GDELT_BASE_URL.to_string(),
            gdelt_daily_base_url: DEFAULT_GDELT_DAILY_BASE_URL.to_string(),
            realtime_interval_min: 15,
            daily_hour_utc: 0,
            top_n: 50,
            port: 8080,
            columns: ColumnLayout::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, NewstrendsError> {
        let defaults = Self::default();
        let columns = ColumnLayout {
            themes: parsed_var("V2THEMES_INDEX", defaults.columns.themes)?,
            persons: parsed_var("V2PERSONS_INDEX", defaults.columns.persons)?,
            orgs: parsed_var("V2ORGS_INDEX", defaults.columns.orgs)?,
            document_identifier: parsed_var("DOCID_INDEX", defaults.columns.document_identifier)?,
        };

        let config = Self {
            database_url: var("DATABASE_URL"),
            redis: RedisConfig {
                host: var("REDIS_HOST").unwrap_or(defaults.redis.host),
                port: parsed_var("REDIS_PORT", defaults.redis.port)?,
                password: var("REDIS_PASSWORD"),
            },
            gdelt_base_url: var("GDELT_BASE_URL").unwrap_or(defaults.gdelt_base_url),
            gdelt_daily_base_url: var("GDELT_DAILY_BASE_URL")
                .unwrap_or(defaults.gdelt_daily_base_url),
            realtime_interval_min: parsed_var(
                "REALTIME_INTERVAL_MIN",
                defaults.realtime_interval_min,
            )?,
            daily_hour_utc: parsed_var("DAILY_HOUR_UTC", defaults.daily_hour_utc)?,
            top_n: parsed_var("TOP_N", defaults.top_n)?,
            port: parsed_var("PORT", defaults.port)?,
            columns,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), NewstrendsError> {
        if self.realtime_interval_min == 0 {
            return Err(NewstrendsError::Config(
                "REALTIME_INTERVAL_MIN must be at least 1".to_string(),
            ));
        }
        if self.daily_hour_utc > 23 {
            return Err(NewstrendsError::Config(format!(
                "DAILY_HOUR_UTC must be 0-23, got {}",
                self.daily_hour_utc
            )));
        }
        if self.top_n == 0 {
            return Err(NewstrendsError::Config("TOP_N must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Required-store accessor for commands that cannot run without one.
    pub fn require_database_url(&self) -> Result<&str, NewstrendsError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| NewstrendsError::Config("DATABASE_URL is not set".to_string()))
    }

    /// Realtime snapshots stay cached for one ingest interval.
    pub fn realtime_cache_ttl(&self) -> u64 {
        self.realtime_interval_min * 60
    }
}

fn var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn parsed_var<T>(key: &str, default: T) -> Result<T, NewstrendsError>
where
    T: FromStr,
    T::Err: Display,
{
    match var(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| NewstrendsError::Config(format!("{key}={raw}: {e}"))),
    }
}
