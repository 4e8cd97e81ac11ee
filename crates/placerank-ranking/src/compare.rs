//! "Time machine" lookups over a chart series.
//!
//! Offsets are positional: `days_ago = 30` means the 30th data point back from
//! the newest one, not the point dated exactly 30 calendar days earlier. A
//! series with missing crawl days therefore reaches further back in calendar
//! time than the offset suggests.

use serde::Serialize;

use crate::chart::ChartSeriesPoint;

/// Newest point compared with the point `days_ago` positions back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PointComparison {
    pub days_ago: usize,
    pub current: ChartSeriesPoint,
    pub historical: ChartSeriesPoint,
    /// Positive when the place climbed (historical rank minus current rank).
    /// `None` if either side was unranked.
    pub rank_change: Option<i64>,
    pub blog_review_delta: i64,
    pub receipt_review_delta: i64,
    pub saved_delta: i64,
}

/// Resolve the point `days_ago` positions before the newest point of an
/// ascending series.
///
/// `days_ago == 0` always yields `None`: callers treat a zero offset as "no
/// comparison" and render today's point on their own. Offsets beyond the
/// available history also yield `None`.
#[must_use]
pub fn resolve_historical_point(
    series: &[ChartSeriesPoint],
    days_ago: usize,
) -> Option<&ChartSeriesPoint> {
    if days_ago == 0 {
        return None;
    }
    let target = series.len().checked_sub(1)?.checked_sub(days_ago)?;
    series.get(target)
}

/// Compare the newest point against the one `days_ago` positions back.
#[must_use]
pub fn compare_to_history(series: &[ChartSeriesPoint], days_ago: usize) -> Option<PointComparison> {
    let historical = *resolve_historical_point(series, days_ago)?;
    let current = *series.last()?;

    let rank_change = match (historical.rank, current.rank) {
        (Some(then), Some(now)) => Some(i64::from(then) - i64::from(now)),
        _ => None,
    };

    Some(PointComparison {
        days_ago,
        current,
        historical,
        rank_change,
        blog_review_delta: signed_delta(current.blog_review_count, historical.blog_review_count),
        receipt_review_delta: signed_delta(
            current.receipt_review_count,
            historical.receipt_review_count,
        ),
        saved_delta: signed_delta(current.saved_count, historical.saved_count),
    })
}

fn signed_delta(now: u64, then: u64) -> i64 {
    let delta = i128::from(now) - i128::from(then);
    i64::try_from(delta).unwrap_or(if delta.is_negative() { i64::MIN } else { i64::MAX })
}
