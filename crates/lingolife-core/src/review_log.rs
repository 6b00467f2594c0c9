//! The per-day record of which words were already reviewed.
//!
//! Lives in a client-local [`KeyValueStore`] under date-scoped keys:
//!
//! - `reviewed_words_<YYYY-MM-DD>`: JSON array of word ids, insertion order
//! - `review_tally_<YYYY-MM-DD>`: `{"known": n, "unknown": m}`
//! - `reviewed_words_index`: JSON array of the dates that have keys
//!
//! A new day means a new key, so rollover needs no work. The index lets
//! [`DailyReviewLog::prune`] drop days older than the retention window
//! using only get/set/delete.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::traits::KeyValueStore;

const REVIEWED_PREFIX: &str = "reviewed_words_";
const TALLY_PREFIX: &str = "review_tally_";
const INDEX_KEY: &str = "reviewed_words_index";

/// Days of history kept by default.
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// Key holding the reviewed-word ids for a date.
pub fn reviewed_key(date: NaiveDate) -> String {
    format!("{REVIEWED_PREFIX}{}", date.format("%Y-%m-%d"))
}

fn tally_key(date: NaiveDate) -> String {
    format!("{TALLY_PREFIX}{}", date.format("%Y-%m-%d"))
}

/// Known/unknown outcomes recorded on one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTally {
    pub known: u32,
    pub unknown: u32,
}

impl DailyTally {
    pub fn total(&self) -> u32 {
        self.known + self.unknown
    }
}

/// Reviewed-today bookkeeping over a key-value store.
pub struct DailyReviewLog<K> {
    store: K,
    retention_days: u32,
}

impl<K: KeyValueStore> DailyReviewLog<K> {
    pub fn new(store: K) -> Self {
        Self {
            store,
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }

    /// Keep this many days, today included. Zero is treated as one.
    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = days.max(1);
        self
    }

    /// Ids reviewed on `date`, in the order they were first marked.
    pub fn reviewed_on(&self, date: NaiveDate) -> Result<Vec<String>> {
        self.read_json(&reviewed_key(date))
    }

    /// Add `word_id` to the date's set. Returns `false` if it was already there.
    pub fn mark_reviewed(&self, date: NaiveDate, word_id: &str) -> Result<bool> {
        let key = reviewed_key(date);
        let mut ids: Vec<String> = self.read_json(&key)?;
        if ids.iter().any(|id| id == word_id) {
            return Ok(false);
        }
        ids.push(word_id.to_string());
        self.write_json(&key, &ids)?;
        self.track_date(date)?;
        Ok(true)
    }

    /// Count one outcome towards the date's tally.
    pub fn record_tally(&self, date: NaiveDate, known: bool) -> Result<DailyTally> {
        let key = tally_key(date);
        let mut tally: DailyTally = self.read_json(&key)?;
        if known {
            tally.known += 1;
        } else {
            tally.unknown += 1;
        }
        self.write_json(&key, &tally)?;
        self.track_date(date)?;
        Ok(tally)
    }

    pub fn tally_on(&self, date: NaiveDate) -> Result<DailyTally> {
        self.read_json(&tally_key(date))
    }

    /// Delete every tracked day older than the retention window.
    /// Returns the number of days removed.
    pub fn prune(&self, today: NaiveDate) -> Result<usize> {
        let oldest_kept = today - Duration::days(i64::from(self.retention_days) - 1);
        let dates = self.tracked_dates()?;
        let (expired, kept): (BTreeSet<_>, BTreeSet<_>) =
            dates.into_iter().partition(|d| *d < oldest_kept);

        for date in &expired {
            self.store.delete(&reviewed_key(*date))?;
            self.store.delete(&tally_key(*date))?;
        }
        if !expired.is_empty() {
            self.write_index(&kept)?;
            tracing::debug!(removed = expired.len(), "pruned review history");
        }
        Ok(expired.len())
    }

    /// Dates that currently have review keys.
    pub fn tracked_dates(&self) -> Result<BTreeSet<NaiveDate>> {
        let raw: Vec<String> = self.read_json(INDEX_KEY)?;
        Ok(raw
            .iter()
            .filter_map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .collect())
    }

    fn track_date(&self, date: NaiveDate) -> Result<()> {
        let mut dates = self.tracked_dates()?;
        if dates.insert(date) {
            self.write_index(&dates)?;
        }
        Ok(())
    }

    fn write_index(&self, dates: &BTreeSet<NaiveDate>) -> Result<()> {
        let raw: Vec<String> = dates
            .iter()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .collect();
        self.write_json(INDEX_KEY, &raw)
    }

    fn read_json<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(T::default());
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding unreadable review state");
                Ok(T::default())
            }
        }
    }

    fn write_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value).context("failed to encode review state")?;
        self.store.set(key, &raw)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::kv::MemoryKvStore;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn key_format() {
        assert_eq!(reviewed_key(day("2025-03-07")), "reviewed_words_2025-03-07");
    }

    #[test]
    fn marking_is_idempotent_and_ordered() {
        let kv = Arc::new(MemoryKvStore::new());
        let log = DailyReviewLog::new(Arc::clone(&kv));
        let today = day("2025-03-07");

        assert!(log.mark_reviewed(today, "b").unwrap());
        assert!(log.mark_reviewed(today, "a").unwrap());
        assert!(!log.mark_reviewed(today, "b").unwrap());

        assert_eq!(log.reviewed_on(today).unwrap(), vec!["b", "a"]);
        assert_eq!(
            kv.get("reviewed_words_2025-03-07").unwrap().as_deref(),
            Some(r#"["b","a"]"#)
        );
        assert!(log.reviewed_on(day("2025-03-08")).unwrap().is_empty());
    }

    #[test]
    fn tallies_accumulate_per_day() {
        let log = DailyReviewLog::new(MemoryKvStore::new());
        let today = day("2025-03-07");
        log.record_tally(today, true).unwrap();
        log.record_tally(today, false).unwrap();
        let tally = log.record_tally(today, true).unwrap();
        assert_eq!(tally, DailyTally { known: 2, unknown: 1 });
        assert_eq!(log.tally_on(today).unwrap().total(), 3);
        assert_eq!(log.tally_on(day("2025-03-06")).unwrap().total(), 0);
    }

    #[test]
    fn prune_drops_days_outside_window() {
        let kv = Arc::new(MemoryKvStore::new());
        let log = DailyReviewLog::new(Arc::clone(&kv)).with_retention_days(30);
        let today = day("2025-03-31");

        log.mark_reviewed(day("2025-01-15"), "old").unwrap();
        log.record_tally(day("2025-01-15"), true).unwrap();
        log.mark_reviewed(day("2025-03-01"), "edge_out").unwrap();
        log.mark_reviewed(day("2025-03-02"), "edge_in").unwrap();
        log.mark_reviewed(today, "now").unwrap();

        assert_eq!(log.prune(today).unwrap(), 2);
        assert!(kv.get("reviewed_words_2025-01-15").unwrap().is_none());
        assert!(kv.get("review_tally_2025-01-15").unwrap().is_none());
        assert!(kv.get("reviewed_words_2025-03-01").unwrap().is_none());
        assert_eq!(log.reviewed_on(day("2025-03-02")).unwrap(), vec!["edge_in"]);

        let tracked = log.tracked_dates().unwrap();
        assert_eq!(tracked.len(), 2);
        assert_eq!(log.prune(today).unwrap(), 0);
    }

    #[test]
    fn corrupt_state_reads_as_empty() {
        let kv = Arc::new(MemoryKvStore::new());
        kv.set("reviewed_words_2025-03-07", "not json").unwrap();
        let log = DailyReviewLog::new(Arc::clone(&kv));
        assert!(log.reviewed_on(day("2025-03-07")).unwrap().is_empty());
        assert!(log.mark_reviewed(day("2025-03-07"), "a").unwrap());
    }
}
