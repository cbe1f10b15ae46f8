//! Timestamp handling for log records: ISO-8601 parsing, UTC calendar-date
//! bucketing, and floor-to-second keys for transcript version grouping.

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};

pub struct TimestampParser;

impl TimestampParser {
    /// Parse a timestamp string into a `DateTime<Utc>`. Accepts RFC 3339
    /// (with `Z` or explicit offset) and offset-less ISO datetimes, which are
    /// assumed UTC.
    pub fn parse(timestamp_str: &str) -> Result<DateTime<Utc>> {
        let trimmed = timestamp_str.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(dt.with_timezone(&Utc));
        }

        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f") {
            return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
        }

        anyhow::bail!("unparsable timestamp: {}", timestamp_str)
    }

    /// UTC calendar-date bucket (`YYYY-MM-DD`) for aggregation. Absent or
    /// unparsable timestamps bucket under the literal `"unknown"`.
    pub fn date_key(timestamp: Option<&str>) -> String {
        timestamp
            .and_then(|ts| Self::parse(ts).ok())
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Unix epoch second (fractional part dropped), the grouping key for
    /// same-turn version detection.
    pub fn epoch_second(timestamp: Option<&str>) -> Option<i64> {
        timestamp
            .and_then(|ts| Self::parse(ts).ok())
            .map(|dt| dt.timestamp())
    }
}
