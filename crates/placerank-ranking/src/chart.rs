use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use placerank_core::RankingRecord;
use serde::{Deserialize, Serialize};

/// One chart point per crawl date. Counters are zero-filled so chart series
/// stay numeric; `rank` stays optional because "not found" is not rank 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSeriesPoint {
    pub date: NaiveDate,
    pub rank: Option<u32>,
    pub blog_review_count: u64,
    pub receipt_review_count: u64,
    pub saved_count: u64,
}

/// Trailing window of `days` calendar days ending on `until` (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartWindow {
    pub days: u32,
    pub until: NaiveDate,
}

impl ChartWindow {
    #[must_use]
    pub fn last_days(days: u32, until: NaiveDate) -> Self {
        Self { days, until }
    }

    /// First date kept by the window.
    #[must_use]
    pub fn starts_on(&self) -> NaiveDate {
        self.until
            .checked_sub_days(Days::new(u64::from(self.days.saturating_sub(1))))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Only the lower bound is enforced: crawl dates stamped after `until`
    /// (clock skew between crawler and caller) are kept.
    #[must_use]
    pub fn includes(&self, date: NaiveDate) -> bool {
        date >= self.starts_on()
    }
}

/// Build the per-date chart series for one keyword.
///
/// When `active_place_id` is given and matches at least one record with a
/// parseable date, only that place's records are used. Otherwise every record
/// is used, so "no specific place" views still get a series; callers rely on
/// this fallback. With all records in play, the last record seen for a date
/// supplies that date's point.
///
/// Records with an unparseable `date_key` are skipped. When `window` is set,
/// points older than its start are dropped.
#[must_use]
pub fn build_chart_series(
    records: &[RankingRecord],
    active_place_id: Option<&str>,
    window: Option<ChartWindow>,
) -> Vec<ChartSeriesPoint> {
    let dated: Vec<(NaiveDate, &RankingRecord)> = records
        .iter()
        .filter_map(|r| r.crawl_date().map(|date| (date, r)))
        .collect();

    let scoped: Vec<(NaiveDate, &RankingRecord)> = match active_place_id.filter(|id| !id.is_empty()) {
        Some(place_id) => {
            let matching: Vec<(NaiveDate, &RankingRecord)> = dated
                .iter()
                .filter(|(_, r)| r.place_id == place_id)
                .copied()
                .collect();
            if matching.is_empty() {
                tracing::debug!(
                    place_id,
                    "active place has no dated ranking records; charting all records"
                );
                dated
            } else {
                matching
            }
        }
        None => dated,
    };

    let by_date: BTreeMap<NaiveDate, &RankingRecord> = scoped.into_iter().collect();

    by_date
        .into_iter()
        .filter(|(date, _)| window.is_none_or(|w| w.includes(*date)))
        .map(|(date, record)| ChartSeriesPoint {
            date,
            rank: record.rank(),
            blog_review_count: record.blog_review_count.unwrap_or(0),
            receipt_review_count: record.receipt_review_count.unwrap_or(0),
            saved_count: record.saved_count.unwrap_or(0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(place_id: &str, ranking: Option<u32>, date_key: &str) -> RankingRecord {
        RankingRecord {
            keyword: "홍대 맛집".to_string(),
            place_id: place_id.to_string(),
            place_name: String::new(),
            category: String::new(),
            ranking,
            date_key: date_key.to_string(),
            blog_review_count: Some(10),
            receipt_review_count: None,
            saved_count: Some(3),
        }
    }

    #[test]
    fn empty_input_yields_empty_series() {
        assert!(build_chart_series(&[], Some("p"), None).is_empty());
    }

    #[test]
    fn series_is_sorted_ascending_by_date() {
        let records = vec![
            record("p", Some(3), "2024-01-03"),
            record("p", Some(1), "2024-01-01"),
            record("p", Some(2), "2024-01-02"),
        ];
        let series = build_chart_series(&records, Some("p"), None);
        let dates: Vec<_> = series.iter().map(|p| p.date).collect();
        assert_eq!(
            dates,
            vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)]
        );
        assert_eq!(series[2].rank, Some(3));
    }

    #[test]
    fn active_place_is_preferred_for_shared_dates() {
        let records = vec![
            record("mine", Some(4), "2024-01-01"),
            record("theirs", Some(1), "2024-01-01"),
        ];
        let series = build_chart_series(&records, Some("mine"), None);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].rank, Some(4));
    }

    #[test]
    fn unknown_active_place_falls_back_to_all_records() {
        let records = vec![
            record("a", Some(4), "2024-01-01"),
            record("b", Some(1), "2024-01-02"),
        ];
        let series = build_chart_series(&records, Some("missing"), None);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn active_place_with_only_undated_records_falls_back_to_all_records() {
        let records = vec![
            record("mine", Some(2), "not-a-date"),
            record("other", Some(1), "2024-01-01"),
        ];
        let series = build_chart_series(&records, Some("mine"), None);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].date, date(2024, 1, 1));
        assert_eq!(series[0].rank, Some(1));
    }

    #[test]
    fn empty_active_place_id_means_no_filter() {
        let records = vec![record("a", Some(4), "2024-01-01")];
        let series = build_chart_series(&records, Some(""), None);
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn last_record_for_a_date_wins_without_filter() {
        let records = vec![
            record("a", Some(4), "2024-01-01"),
            record("b", Some(9), "2024-01-01"),
        ];
        let series = build_chart_series(&records, None, None);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].rank, Some(9));
    }

    #[test]
    fn missing_counters_are_zero_filled_and_rank_stays_optional() {
        let records = vec![record("p", None, "2024-01-01")];
        let series = build_chart_series(&records, Some("p"), None);
        assert_eq!(series[0].rank, None);
        assert_eq!(series[0].blog_review_count, 10);
        assert_eq!(series[0].receipt_review_count, 0);
        assert_eq!(series[0].saved_count, 3);
    }

    #[test]
    fn window_keeps_only_trailing_days() {
        let records: Vec<RankingRecord> = (1..=31)
            .map(|day| record("p", Some(day), &format!("2024-01-{day:02}")))
            .chain((1..=14).map(|day| record("p", Some(day), &format!("2024-02-{day:02}"))))
            .collect();
        let window = ChartWindow::last_days(30, date(2024, 2, 14));
        let series = build_chart_series(&records, Some("p"), Some(window));
        assert_eq!(series.len(), 30);
        assert_eq!(series[0].date, date(2024, 1, 16));
        assert_eq!(series[29].date, date(2024, 2, 14));
    }

    #[test]
    fn window_anchor_ahead_of_latest_crawl_shrinks_series() {
        let records = vec![
            record("p", Some(1), "2024-01-01"),
            record("p", Some(1), "2024-01-20"),
        ];
        let window = ChartWindow::last_days(30, date(2024, 2, 10));
        let series = build_chart_series(&records, Some("p"), Some(window));
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].date, date(2024, 1, 20));
    }

    #[test]
    fn window_starts_on_is_inclusive() {
        let window = ChartWindow::last_days(1, date(2024, 3, 1));
        assert_eq!(window.starts_on(), date(2024, 3, 1));
        assert!(window.includes(date(2024, 3, 1)));
        assert!(!window.includes(date(2024, 2, 29)));
        assert!(window.includes(date(2024, 3, 2)));
    }
}
