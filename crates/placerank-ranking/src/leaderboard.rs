//! Dense leaderboard for the most recent crawl date.
//!
//! The crawl only reports the places it found, so occupied ranks can have
//! holes (nobody at rank 2 today). The leaderboard fills every slot from 1 to
//! the deepest observed rank, using placeholder rows for the holes so list keys
//! stay stable and unique.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use placerank_core::{RankingRecord, SecondaryMetrics};
use serde::Serialize;

use crate::history::group_by_date;

/// A real place occupying a leaderboard slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceStanding {
    pub place_id: String,
    pub place_name: String,
    pub category: String,
    pub keyword: String,
    /// Latest-day counters, with gaps back-filled from the place's own history.
    /// Still `None` when no earlier crawl knew the value either.
    pub metrics: SecondaryMetrics,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RankSlot {
    Occupied(PlaceStanding),
    Empty { placeholder_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DenseRankRow {
    pub rank: u32,
    #[serde(flatten)]
    pub slot: RankSlot,
}

impl DenseRankRow {
    /// The occupying place's id, or the `empty-<rank>` placeholder.
    #[must_use]
    pub fn place_id(&self) -> &str {
        match &self.slot {
            RankSlot::Occupied(standing) => &standing.place_id,
            RankSlot::Empty { placeholder_id } => placeholder_id,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self.slot, RankSlot::Empty { .. })
    }

    /// Counters for the slot; all `None` for placeholder rows.
    #[must_use]
    pub fn metrics(&self) -> SecondaryMetrics {
        match &self.slot {
            RankSlot::Occupied(standing) => standing.metrics,
            RankSlot::Empty { .. } => SecondaryMetrics::default(),
        }
    }
}

/// Build the leaderboard for the latest crawl date found in `records`.
///
/// Records are expected to belong to a single keyword. The latest date is
/// chosen chronologically. Rows cover ranks `1..=max_rank` of that day with no
/// gaps; unranked or undated records never occupy a slot, and ranks above
/// [`placerank_core::MAX_RANK`] count as unranked. Returns an empty list
/// when the latest day has no ranked record.
#[must_use]
pub fn build_dense_leaderboard(records: &[RankingRecord]) -> Vec<DenseRankRow> {
    let by_date = group_by_date(records);
    let Some((&latest, todays)) = by_date.last_key_value() else {
        return Vec::new();
    };

    let mut occupied: Vec<(u32, &RankingRecord)> = todays
        .iter()
        .filter_map(|record| record.rank().map(|rank| (rank, *record)))
        .collect();
    occupied.sort_by_key(|(rank, _)| *rank);

    let Some(&(max_rank, _)) = occupied.last() else {
        tracing::debug!(%latest, "latest crawl day has no ranked places");
        return Vec::new();
    };

    let mut by_rank: HashMap<u32, &RankingRecord> = HashMap::with_capacity(occupied.len());
    for (rank, record) in occupied {
        if let Some(holder) = by_rank.get(&rank) {
            tracing::debug!(
                rank,
                kept = %holder.place_id,
                dropped = %record.place_id,
                "two places share a rank on the latest day; keeping the first"
            );
            continue;
        }
        by_rank.insert(rank, record);
    }

    (1..=max_rank)
        .map(|rank| {
            let slot = match by_rank.get(&rank) {
                Some(record) => RankSlot::Occupied(standing_for(record, latest, &by_date)),
                None => RankSlot::Empty {
                    placeholder_id: format!("empty-{rank}"),
                },
            };
            DenseRankRow { rank, slot }
        })
        .collect()
}

fn standing_for(
    record: &RankingRecord,
    latest: NaiveDate,
    by_date: &BTreeMap<NaiveDate, Vec<&RankingRecord>>,
) -> PlaceStanding {
    PlaceStanding {
        place_id: record.place_id.clone(),
        place_name: record.place_name.clone(),
        category: record.category.clone(),
        keyword: record.keyword.clone(),
        metrics: backfilled_metrics(record, latest, by_date),
    }
}

/// Fills missing counters from the same place's earlier crawls, most recent
/// first, each counter independently.
fn backfilled_metrics(
    record: &RankingRecord,
    latest: NaiveDate,
    by_date: &BTreeMap<NaiveDate, Vec<&RankingRecord>>,
) -> SecondaryMetrics {
    let mut metrics = record.metrics();
    if metrics.is_complete() || record.place_id.is_empty() {
        return metrics;
    }

    for (_, day) in by_date.range(..latest).rev() {
        for older in day.iter().filter(|r| r.place_id == record.place_id) {
            metrics.fill_missing_from(&older.metrics());
        }
        if metrics.is_complete() {
            break;
        }
    }
    metrics
}

#[cfg(test)]
#[path = "leaderboard_test.rs"]
mod tests;
