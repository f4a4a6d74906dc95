use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NewstrendsError;

/// Which aggregation produced a trend document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendType {
    Realtime,
    Daily,
    Ranked,
}

impl TrendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendType::Realtime => "realtime",
            TrendType::Daily => "daily",
            TrendType::Ranked => "ranked",
        }
    }
}

impl fmt::Display for TrendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrendType {
    type Err = NewstrendsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "realtime" => Ok(TrendType::Realtime),
            "daily" => Ok(TrendType::Daily),
            "ranked" => Ok(TrendType::Ranked),
            other => Err(NewstrendsError::Other(format!("unknown trend type: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Themes,
    Persons,
    Orgs,
    Documents,
}

impl Category {
    /// The three entity categories populated directly from GKG columns.
    pub const ENTITIES: [Category; 3] = [Category::Themes, Category::Persons, Category::Orgs];

    pub const ALL: [Category; 4] = [
        Category::Themes,
        Category::Persons,
        Category::Orgs,
        Category::Documents,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Themes => "themes",
            Category::Persons => "persons",
            Category::Orgs => "orgs",
            Category::Documents => "documents",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = NewstrendsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "themes" => Ok(Category::Themes),
            "persons" => Ok(Category::Persons),
            "orgs" => Ok(Category::Orgs),
            "documents" => Ok(Category::Documents),
            other => Err(NewstrendsError::Other(format!("unknown category: {other}"))),
        }
    }
}

/// A single keyword entry inside a trend document.
///
/// `score` is populated only on `ranked` trends; `documents` carries the
/// set of source document identifiers the word appeared in, when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub word: String,
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<BTreeSet<String>>,
}

impl Keyword {
    pub fn new(word: impl Into<String>, count: u64) -> Self {
        Self {
            word: word.into(),
            count,
            score: None,
            documents: None,
        }
    }

    pub fn scored(word: impl Into<String>, count: u64, score: u32) -> Self {
        Self {
            word: word.into(),
            count,
            score: Some(score),
            documents: None,
        }
    }
}

/// A materialized aggregation, keyed by `(type, date, category)`.
///
/// The key identifies the document in the store; `timestamp` is payload.
/// Writes with the same key replace the whole body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub trend_type: TrendType,
    pub date: NaiveDate,
    pub category: Category,
    pub keywords: Vec<Keyword>,
}

impl Trend {
    /// A realtime snapshot dated by the GDELT file instant.
    pub fn realtime(timestamp: DateTime<Utc>, category: Category, keywords: Vec<Keyword>) -> Self {
        Self {
            timestamp,
            trend_type: TrendType::Realtime,
            date: timestamp.date_naive(),
            category,
            keywords,
        }
    }

    /// A daily rollup, stamped at UTC midday of its date.
    pub fn daily(date: NaiveDate, category: Category, keywords: Vec<Keyword>) -> Self {
        let timestamp = date
            .and_hms_opt(12, 0, 0)
            .expect("midday is always a valid time")
            .and_utc();
        Self {
            timestamp,
            trend_type: TrendType::Daily,
            date,
            category,
            keywords,
        }
    }

    /// A ranked document, stamped at the moment of computation.
    pub fn ranked(date: NaiveDate, category: Category, keywords: Vec<Keyword>) -> Self {
        Self {
            timestamp: Utc::now(),
            trend_type: TrendType::Ranked,
            date,
            category,
            keywords,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_type_roundtrip() {
        for t in [TrendType::Realtime, TrendType::Daily, TrendType::Ranked] {
            assert_eq!(t.as_str().parse::<TrendType>().unwrap(), t);
        }
        assert!("weekly".parse::<TrendType>().is_err());
    }

    #[test]
    fn category_roundtrip() {
        for c in Category::ALL {
            assert_eq!(c.as_str().parse::<Category>().unwrap(), c);
        }
        assert!("locations".parse::<Category>().is_err());
    }

    #[test]
    fn keyword_serde_omits_empty_optionals() {
        let kw = Keyword::new("climate", 7);
        let json = serde_json::to_value(&kw).unwrap();
        assert_eq!(json["word"], "climate");
        assert_eq!(json["count"], 7);
        assert!(json.get("score").is_none());
        assert!(json.get("documents").is_none());

        let scored = Keyword::scored("climate", 7, 100);
        let json = serde_json::to_value(&scored).unwrap();
        assert_eq!(json["score"], 100);
    }

    #[test]
    fn trend_serializes_type_field() {
        let trend = Trend::daily(
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            Category::Themes,
            vec![Keyword::new("election", 3)],
        );
        let json = serde_json::to_value(&trend).unwrap();
        assert_eq!(json["type"], "daily");
        assert_eq!(json["category"], "themes");
        assert_eq!(json["date"], "2024-05-01");
    }

    #[test]
    fn daily_trend_is_stamped_at_utc_midday() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let trend = Trend::daily(date, Category::Persons, Vec::new());
        assert_eq!(trend.timestamp.to_rfc3339(), "2024-05-01T12:00:00+00:00");
        assert_eq!(trend.date, date);
    }

    #[test]
    fn realtime_trend_dates_from_timestamp() {
        let ts = "2024-05-01T08:15:00Z".parse::<DateTime<Utc>>().unwrap();
        let trend = Trend::realtime(ts, Category::Orgs, Vec::new());
        assert_eq!(trend.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    }
}
