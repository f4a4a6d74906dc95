//! GDELT artifact names and URLs. The 15-minute feed publishes
//! `YYYYMMDDhhmm00.gkg.csv.zip` on quarter-hour boundaries; the daily
//! rollup feed publishes `YYYYMMDD.gkg.csv.zip`.

use chrono::{DateTime, NaiveDate, Timelike, Utc};

/// Floor a timestamp to the previous quarter-hour boundary, zeroing
/// seconds and below.
pub fn floor_to_quarter_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_minute(ts.minute() - ts.minute() % 15)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .expect("flooring minutes never leaves the valid range")
}

pub fn realtime_filename(ts: DateTime<Utc>) -> String {
    format!(
        "{}.gkg.csv.zip",
        floor_to_quarter_hour(ts).format("%Y%m%d%H%M%S")
    )
}

pub fn daily_filename(date: NaiveDate) -> String {
    format!("{}.gkg.csv.zip", date.format("%Y%m%d"))
}

pub fn realtime_url(base_url: &str, ts: DateTime<Utc>) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), realtime_filename(ts))
}

pub fn daily_url(base_url: &str, date: NaiveDate) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), daily_filename(date))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn realtime_filename_floors_minutes_to_fifteen() {
        assert_eq!(
            realtime_filename(ts("2024-05-01T08:22:17Z")),
            "20240501081500.gkg.csv.zip"
        );
        assert_eq!(
            realtime_filename(ts("2024-05-01T08:00:00Z")),
            "20240501080000.gkg.csv.zip"
        );
        assert_eq!(
            realtime_filename(ts("2024-05-01T23:59:59Z")),
            "20240501234500.gkg.csv.zip"
        );
    }

    #[test]
    fn daily_filename_is_date_only() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(daily_filename(date), "20240501.gkg.csv.zip");
    }

    #[test]
    fn urls_join_without_double_slashes() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(
            daily_url("http://data.gdeltproject.org/gkg/", date),
            "http://data.gdeltproject.org/gkg/20240501.gkg.csv.zip"
        );
        assert_eq!(
            realtime_url("http://data.gdeltproject.org/gdeltv2", ts("2024-05-01T08:22:17Z")),
            "http://data.gdeltproject.org/gdeltv2/20240501081500.gkg.csv.zip"
        );
    }
}
