use std::collections::BTreeMap;

use chrono::NaiveDate;
use placerank_core::RankingRecord;

/// Groups records by parsed crawl date, oldest first. Records whose
/// `date_key` does not parse are dropped. Input order is kept within a day.
pub(crate) fn group_by_date(records: &[RankingRecord]) -> BTreeMap<NaiveDate, Vec<&RankingRecord>> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&RankingRecord>> = BTreeMap::new();
    let mut skipped = 0usize;
    for record in records {
        match record.crawl_date() {
            Some(date) => by_date.entry(date).or_default().push(record),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!(skipped, "ignoring records with unparseable date_key");
    }
    by_date
}

/// Splits a multi-keyword payload into per-keyword record sets, keyed by
/// keyword in lexical order.
#[must_use]
pub fn partition_by_keyword(records: &[RankingRecord]) -> BTreeMap<String, Vec<RankingRecord>> {
    let mut by_keyword: BTreeMap<String, Vec<RankingRecord>> = BTreeMap::new();
    for record in records {
        by_keyword
            .entry(record.keyword.clone())
            .or_default()
            .push(record.clone());
    }
    by_keyword
}
