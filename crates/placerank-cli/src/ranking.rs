//! Handlers for the read-only ranking commands: `leaderboard`, `chart` and
//! `compare`. Each reads a JSON crawl export, narrows it to one keyword and
//! prints the result as pretty JSON on stdout.

use std::path::Path;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use placerank_core::{parse_records_json, RankingRecord};
use placerank_ranking::{
    build_chart_series, build_dense_leaderboard, compare_to_history, partition_by_keyword,
    ChartWindow,
};
use serde::Serialize;

use crate::WindowAnchor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WindowRequest {
    AllHistory,
    Trailing { days: u32, anchor: WindowAnchor },
}

fn load_records(path: &Path) -> anyhow::Result<Vec<RankingRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read ranking export {}", path.display()))?;
    let records = parse_records_json(&raw)
        .with_context(|| format!("failed to parse ranking export {}", path.display()))?;
    tracing::debug!(path = %path.display(), records = records.len(), "loaded ranking export");
    Ok(records)
}

/// Narrow `records` to a single keyword.
///
/// With `keyword` set, only that keyword's records are kept. Without it the
/// input must not mix keywords, since one leaderboard never spans two.
pub(crate) fn select_keyword(
    records: Vec<RankingRecord>,
    keyword: Option<&str>,
) -> anyhow::Result<Vec<RankingRecord>> {
    let mut by_keyword = partition_by_keyword(&records);
    match keyword {
        Some(k) => Ok(by_keyword.remove(k).unwrap_or_default()),
        None if by_keyword.len() > 1 => {
            let keywords: Vec<&str> = by_keyword.keys().map(String::as_str).collect();
            anyhow::bail!(
                "input holds several keywords ({}); pick one with --keyword",
                keywords.join(", ")
            )
        }
        None => Ok(records),
    }
}

/// Resolve the requested window against the loaded records.
pub(crate) fn resolve_window(
    request: WindowRequest,
    records: &[RankingRecord],
    today: NaiveDate,
) -> Option<ChartWindow> {
    match request {
        WindowRequest::AllHistory => None,
        WindowRequest::Trailing { days, anchor } => {
            let until = match anchor {
                WindowAnchor::Today => today,
                WindowAnchor::Latest => records
                    .iter()
                    .filter_map(RankingRecord::crawl_date)
                    .max()
                    .unwrap_or(today),
            };
            Some(ChartWindow::last_days(days, until))
        }
    }
}

fn warn_if_empty(records: &[RankingRecord], keyword: Option<&str>) {
    if records.is_empty() {
        tracing::warn!(keyword = keyword.unwrap_or(""), "no ranking history for keyword");
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn run_leaderboard(input: &Path, keyword: Option<&str>) -> anyhow::Result<()> {
    let records = select_keyword(load_records(input)?, keyword)?;
    warn_if_empty(&records, keyword);
    let rows = build_dense_leaderboard(&records);
    tracing::info!(
        rows = rows.len(),
        empty_slots = rows.iter().filter(|r| r.is_empty()).count(),
        "leaderboard built"
    );
    print_json(&rows)
}

pub(crate) fn run_chart(
    input: &Path,
    keyword: Option<&str>,
    place_id: Option<&str>,
    window: WindowRequest,
) -> anyhow::Result<()> {
    let records = select_keyword(load_records(input)?, keyword)?;
    warn_if_empty(&records, keyword);
    let window = resolve_window(window, &records, Utc::now().date_naive());
    let series = build_chart_series(&records, place_id, window);
    tracing::info!(points = series.len(), "chart series built");
    print_json(&series)
}

pub(crate) fn run_compare(
    input: &Path,
    keyword: Option<&str>,
    place_id: Option<&str>,
    days_ago: usize,
) -> anyhow::Result<()> {
    let records = select_keyword(load_records(input)?, keyword)?;
    warn_if_empty(&records, keyword);
    let series = build_chart_series(&records, place_id, None);
    let comparison = compare_to_history(&series, days_ago);
    if comparison.is_none() {
        tracing::warn!(
            days_ago,
            available = series.len(),
            "no historical point at that offset"
        );
    }
    print_json(&comparison)
}
