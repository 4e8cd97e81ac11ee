//! Keyword ranking time-series reconstruction.
//!
//! Turns flat crawl observations ([`placerank_core::RankingRecord`]) for one
//! keyword into the latest dense leaderboard and a per-date chart series, and
//! resolves historical points for "N days ago" comparisons. Everything here is
//! pure: inputs are borrowed, outputs are freshly allocated, nothing is cached.

pub mod chart;
pub mod compare;
pub mod history;
pub mod leaderboard;

pub use chart::{build_chart_series, ChartSeriesPoint, ChartWindow};
pub use compare::{compare_to_history, resolve_historical_point, PointComparison};
pub use history::partition_by_keyword;
pub use leaderboard::{build_dense_leaderboard, DenseRankRow, PlaceStanding, RankSlot};
