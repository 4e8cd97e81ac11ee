//! Ranking observations as they come back from the crawl backend.
//!
//! [`RawRankingRecord`] mirrors the JSON the backend sends (mixed snake/camel
//! case field names, numbers that are sometimes strings). It converts into the
//! typed [`RankingRecord`] the ranking crate works on. Conversion never fails:
//! values that cannot be interpreted become `None` and the record is treated as
//! unranked downstream.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Deepest search position the crawler reports. Larger ranks are treated as
/// corrupt and read as unranked.
pub const MAX_RANK: u32 = 1_000;

#[derive(Debug, Error)]
pub enum RecordsError {
    #[error("ranking payload is not a JSON array of records: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Review and save counters scraped alongside a ranking. Any of them may be
/// missing on a given day's crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryMetrics {
    pub blog_review_count: Option<u64>,
    pub receipt_review_count: Option<u64>,
    pub saved_count: Option<u64>,
}

impl SecondaryMetrics {
    /// Returns `true` when every counter is known.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.blog_review_count.is_some()
            && self.receipt_review_count.is_some()
            && self.saved_count.is_some()
    }

    /// Fills each missing counter from `older`, leaving known values untouched.
    pub fn fill_missing_from(&mut self, older: &SecondaryMetrics) {
        self.blog_review_count = self.blog_review_count.or(older.blog_review_count);
        self.receipt_review_count = self.receipt_review_count.or(older.receipt_review_count);
        self.saved_count = self.saved_count.or(older.saved_count);
    }
}

/// One crawl observation: a place's position for a keyword on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingRecord {
    pub keyword: String,
    pub place_id: String,
    pub place_name: String,
    pub category: String,
    /// 1-based search rank; `None` when the place was not found in that crawl.
    pub ranking: Option<u32>,
    /// Crawl date as sent by the backend, usually `YYYY-MM-DD`.
    pub date_key: String,
    pub blog_review_count: Option<u64>,
    pub receipt_review_count: Option<u64>,
    pub saved_count: Option<u64>,
}

impl RankingRecord {
    /// The crawl date, parsed chronologically. `None` for malformed keys.
    #[must_use]
    pub fn crawl_date(&self) -> Option<NaiveDate> {
        parse_crawl_date(&self.date_key)
    }

    /// The rank if it is a usable 1-based position.
    #[must_use]
    pub fn rank(&self) -> Option<u32> {
        self.ranking.filter(|r| (1..=MAX_RANK).contains(r))
    }

    #[must_use]
    pub fn metrics(&self) -> SecondaryMetrics {
        SecondaryMetrics {
            blog_review_count: self.blog_review_count,
            receipt_review_count: self.receipt_review_count,
            saved_count: self.saved_count,
        }
    }
}

/// Record shape on the backend wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRankingRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub keyword: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub place_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub place_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub ranking: Option<u64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date_key: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub blog_review_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub receipt_review_count: Option<u64>,
    #[serde(default, rename = "savedCount", deserialize_with = "lenient_count")]
    pub saved_count: Option<u64>,
}

impl From<RawRankingRecord> for RankingRecord {
    fn from(raw: RawRankingRecord) -> Self {
        RankingRecord {
            keyword: raw.keyword.unwrap_or_default(),
            place_id: raw.place_id.unwrap_or_default(),
            place_name: raw.place_name.unwrap_or_default(),
            category: raw.category.unwrap_or_default(),
            ranking: raw
                .ranking
                .and_then(|r| u32::try_from(r).ok())
                .filter(|r| (1..=MAX_RANK).contains(r)),
            date_key: raw.date_key.unwrap_or_default(),
            blog_review_count: raw.blog_review_count,
            receipt_review_count: raw.receipt_review_count,
            saved_count: raw.saved_count,
        }
    }
}

/// Decode a backend ranking payload (a JSON array of records).
///
/// Individual fields are decoded leniently; only a document that is not an
/// array of objects is an error.
///
/// # Errors
///
/// Returns [`RecordsError::Payload`] if `json` is not valid JSON or not an
/// array of objects.
pub fn parse_records_json(json: &str) -> Result<Vec<RankingRecord>, RecordsError> {
    let raw: Vec<RawRankingRecord> = serde_json::from_str(json)?;
    let records: Vec<RankingRecord> = raw.into_iter().map(RankingRecord::from).collect();

    let malformed = records
        .iter()
        .filter(|r| r.crawl_date().is_none())
        .count();
    if malformed > 0 {
        tracing::warn!(
            malformed,
            total = records.len(),
            "ranking records with unparseable date_key will be ignored"
        );
    }

    Ok(records)
}

/// Parse a crawl date key.
///
/// Accepts `YYYY-MM-DD`, `YYYY.MM.DD`, `YYYY/MM/DD`, `YYYYMMDD`, and
/// timestamps (RFC 3339 or naive `YYYY-MM-DDTHH:MM:SS`), whose date part is
/// used.
#[must_use]
pub fn parse_crawl_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        let year = s[..4].parse().ok()?;
        let month = s[4..6].parse().ok()?;
        let day = s[6..].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    for fmt in ["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.date_naive());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|ts| ts.date())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(count_from_value))
}

/// Interprets a JSON number or a numeric string (thousands separators allowed)
/// as a non-negative count.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn count_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().replace(',', "").parse::<u64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_crawl_date_accepts_iso_date() {
        assert_eq!(parse_crawl_date("2024-01-03"), Some(date(2024, 1, 3)));
    }

    #[test]
    fn parse_crawl_date_accepts_dotted_and_compact_forms() {
        assert_eq!(parse_crawl_date("2024.01.03"), Some(date(2024, 1, 3)));
        assert_eq!(parse_crawl_date("20240103"), Some(date(2024, 1, 3)));
        assert_eq!(parse_crawl_date("2024/1/3"), Some(date(2024, 1, 3)));
    }

    #[test]
    fn parse_crawl_date_takes_date_part_of_timestamps() {
        assert_eq!(
            parse_crawl_date("2024-01-03T09:15:00+09:00"),
            Some(date(2024, 1, 3))
        );
        assert_eq!(
            parse_crawl_date("2024-01-03T09:15:00"),
            Some(date(2024, 1, 3))
        );
        assert_eq!(
            parse_crawl_date("2024-01-03 09:15:00"),
            Some(date(2024, 1, 3))
        );
    }

    #[test]
    fn parse_crawl_date_rejects_garbage() {
        assert_eq!(parse_crawl_date(""), None);
        assert_eq!(parse_crawl_date("   "), None);
        assert_eq!(parse_crawl_date("yesterday"), None);
        assert_eq!(parse_crawl_date("2024-13-01"), None);
        assert_eq!(parse_crawl_date("20241301"), None);
    }

    #[test]
    fn raw_record_decodes_wire_field_names() {
        let json = r#"[{
            "keyword": "강남 카페",
            "place_id": "1234567",
            "place_name": "Cafe Onion",
            "category": "카페",
            "ranking": 4,
            "date_key": "2024-01-03",
            "blog_review_count": 120,
            "receipt_review_count": 87,
            "savedCount": 1500
        }]"#;
        let records = parse_records_json(json).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.keyword, "강남 카페");
        assert_eq!(r.place_id, "1234567");
        assert_eq!(r.rank(), Some(4));
        assert_eq!(r.crawl_date(), Some(date(2024, 1, 3)));
        assert_eq!(r.blog_review_count, Some(120));
        assert_eq!(r.receipt_review_count, Some(87));
        assert_eq!(r.saved_count, Some(1500));
    }

    #[test]
    fn raw_record_tolerates_stringly_numbers() {
        let json = r#"[{
            "place_id": 98765,
            "ranking": "7",
            "date_key": "2024-01-03",
            "blog_review_count": "1,204",
            "receipt_review_count": null,
            "savedCount": "n/a"
        }]"#;
        let records = parse_records_json(json).unwrap();
        let r = &records[0];
        assert_eq!(r.place_id, "98765");
        assert_eq!(r.ranking, Some(7));
        assert_eq!(r.blog_review_count, Some(1204));
        assert_eq!(r.receipt_review_count, None);
        assert_eq!(r.saved_count, None);
    }

    #[test]
    fn zero_and_negative_rankings_become_unranked() {
        let json = r#"[
            {"place_id": "a", "ranking": 0, "date_key": "2024-01-03"},
            {"place_id": "b", "ranking": -3, "date_key": "2024-01-03"},
            {"place_id": "c", "ranking": 2.5, "date_key": "2024-01-03"}
        ]"#;
        let records = parse_records_json(json).unwrap();
        assert!(records.iter().all(|r| r.rank().is_none()));
    }

    #[test]
    fn ranks_beyond_max_rank_become_unranked() {
        let json = r#"[
            {"place_id": "a", "ranking": 4000000000, "date_key": "2024-01-03"},
            {"place_id": "b", "ranking": 1001, "date_key": "2024-01-03"},
            {"place_id": "c", "ranking": 1000, "date_key": "2024-01-03"}
        ]"#;
        let records = parse_records_json(json).unwrap();
        assert_eq!(records[0].ranking, None);
        assert_eq!(records[1].ranking, None);
        assert_eq!(records[2].rank(), Some(MAX_RANK));
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let records = parse_records_json("[{}]").unwrap();
        let r = &records[0];
        assert!(r.place_id.is_empty());
        assert!(r.date_key.is_empty());
        assert!(r.crawl_date().is_none());
        assert!(r.rank().is_none());
    }

    #[test]
    fn non_array_payload_is_an_error() {
        let err = parse_records_json(r#"{"records": []}"#).unwrap_err();
        assert!(err.to_string().contains("not a JSON array"));
    }

    #[test]
    fn fill_missing_from_keeps_known_values() {
        let mut current = SecondaryMetrics {
            blog_review_count: Some(10),
            receipt_review_count: None,
            saved_count: None,
        };
        let older = SecondaryMetrics {
            blog_review_count: Some(3),
            receipt_review_count: Some(5),
            saved_count: None,
        };
        current.fill_missing_from(&older);
        assert_eq!(current.blog_review_count, Some(10));
        assert_eq!(current.receipt_review_count, Some(5));
        assert_eq!(current.saved_count, None);
        assert!(!current.is_complete());
    }
}
