//! Day-keyed collections and the recency merge.
//!
//! A [`Collection`] holds at most one record per calendar day and is kept
//! sorted ascending by full timestamp. When two records share a day the one
//! with the strictly later timestamp occupies it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;

use crate::models::Timestamp;

/// A dated measurement that can live in a [`Collection`].
pub trait Record {
    fn timestamp(&self) -> Timestamp;

    fn day_key(&self) -> NaiveDate {
        self.timestamp().day_key()
    }
}

/// What happened to one offered record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The record's day was empty.
    Added,
    /// The record was later than the day's occupant and took its place.
    Replaced,
    /// The day's occupant is as late or later; the record was dropped.
    Duplicate,
}

/// Counts from merging a batch.
///
/// `replaced` records are counted in neither `added` nor `duplicates`.
/// `invalid` counts records rejected before the merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub added: usize,
    pub replaced: usize,
    pub duplicates: usize,
    pub invalid: usize,
}

impl ImportSummary {
    fn count(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Added => self.added += 1,
            MergeOutcome::Replaced => self.replaced += 1,
            MergeOutcome::Duplicate => self.duplicates += 1,
        }
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} added, {} duplicates skipped",
            self.added, self.duplicates
        )?;
        if self.replaced > 0 {
            write!(f, ", {} replaced with newer readings", self.replaced)?;
        }
        if self.invalid > 0 {
            write!(f, ", {} invalid", self.invalid)?;
        }
        Ok(())
    }
}

fn offer<R: Record>(by_day: &mut BTreeMap<NaiveDate, R>, record: R) -> MergeOutcome {
    match by_day.entry(record.day_key()) {
        Entry::Vacant(slot) => {
            slot.insert(record);
            MergeOutcome::Added
        }
        Entry::Occupied(mut slot) => {
            if record.timestamp() > slot.get().timestamp() {
                slot.insert(record);
                MergeOutcome::Replaced
            } else {
                MergeOutcome::Duplicate
            }
        }
    }
}

/// Merges `incoming` into `existing`, in batch order.
///
/// Returns the merged records sorted by timestamp and the counts for the
/// incoming records only.
pub fn merge<R: Record>(
    existing: Vec<R>,
    incoming: impl IntoIterator<Item = R>,
) -> (Vec<R>, ImportSummary) {
    let mut by_day = BTreeMap::new();
    for record in existing {
        offer(&mut by_day, record);
    }

    let mut summary = ImportSummary::default();
    for record in incoming {
        summary.count(offer(&mut by_day, record));
    }

    let mut merged: Vec<R> = by_day.into_values().collect();
    merged.sort_by_key(|r| r.timestamp());
    (merged, summary)
}

/// Records ordered by timestamp, one per day.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<R> {
    records: Vec<R>,
}

impl<R> Default for Collection<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<R: Record> Collection<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection, collapsing same-day records to the latest one.
    pub fn from_records(records: Vec<R>) -> Self {
        let (records, _) = merge(records, std::iter::empty());
        Self { records }
    }

    /// Offers a single record.
    pub fn insert(&mut self, record: R) -> MergeOutcome {
        let day = record.day_key();
        let outcome = match self.records.iter().position(|r| r.day_key() == day) {
            None => {
                self.records.push(record);
                MergeOutcome::Added
            }
            Some(i) if record.timestamp() > self.records[i].timestamp() => {
                self.records[i] = record;
                MergeOutcome::Replaced
            }
            Some(_) => MergeOutcome::Duplicate,
        };
        if outcome != MergeOutcome::Duplicate {
            self.records.sort_by_key(|r| r.timestamp());
        }
        outcome
    }

    /// Merges a batch into this collection.
    pub fn merge(&mut self, incoming: impl IntoIterator<Item = R>) -> ImportSummary {
        let existing = std::mem::take(&mut self.records);
        let (merged, summary) = merge(existing, incoming);
        self.records = merged;
        summary
    }

    /// Removes records for which `keep` returns false.
    pub fn retain(&mut self, keep: impl FnMut(&R) -> bool) {
        self.records.retain(keep);
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn into_records(self) -> Vec<R> {
        self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.records.iter()
    }

    pub fn latest(&self) -> Option<&R> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<R: Serialize> Serialize for Collection<R> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.records.serialize(serializer)
    }
}

impl<'de, R: Record + Deserialize<'de>> Deserialize<'de> for Collection<R> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<R>::deserialize(deserializer).map(Self::from_records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BodyMetric, MetricSource};

    fn metric(date: &str) -> BodyMetric {
        BodyMetric::new(date.parse().unwrap(), 80.0)
    }

    fn wyze(date: &str) -> BodyMetric {
        metric(date).with_source(MetricSource::Wyze)
    }

    fn dates(records: &[BodyMetric]) -> Vec<String> {
        records.iter().map(|r| r.date.to_string()).collect()
    }

    fn assert_sorted_one_per_day(records: &[BodyMetric]) {
        for pair in records.windows(2) {
            assert!(pair[0].date < pair[1].date);
            assert_ne!(pair[0].day_key(), pair[1].day_key());
        }
    }

    #[test]
    fn test_scenario_a_empty_existing() {
        let (merged, summary) = merge(
            vec![],
            vec![wyze("2024-01-10T10:00"), wyze("2024-01-11T10:00")],
        );

        assert_eq!(merged.len(), 2);
        assert_eq!(summary.added, 2);
        assert_eq!(summary.duplicates, 0);
        assert_eq!(summary.replaced, 0);
    }

    #[test]
    fn test_scenario_b_exact_duplicate() {
        let (merged, summary) = merge(
            vec![metric("2024-01-10T10:00")],
            vec![metric("2024-01-10T10:00"), metric("2024-01-11T10:00")],
        );

        assert_eq!(merged.len(), 2);
        assert_eq!(summary.added, 1);
        assert_eq!(summary.duplicates, 1);
    }

    #[test]
    fn test_scenario_c_replacement_is_not_counted() {
        let (merged, summary) = merge(
            vec![metric("2024-01-10T10:00")],
            vec![metric("2024-01-10T12:00"), metric("2024-01-12T10:00")],
        );

        assert_eq!(summary.added, 1);
        assert_eq!(summary.duplicates, 0);
        assert_eq!(summary.replaced, 1);
        assert_eq!(
            dates(&merged),
            vec!["2024-01-10T12:00:00+00:00", "2024-01-12T10:00:00+00:00"]
        );
    }

    #[test]
    fn test_scenario_d_mixed_batch() {
        let (merged, summary) = merge(
            vec![metric("2024-01-10T10:00"), metric("2024-01-12T10:00")],
            vec![
                metric("2024-01-10T10:00"),
                metric("2024-01-11T10:00"),
                metric("2024-01-10T12:00"),
            ],
        );

        assert_eq!(summary.added, 1);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.replaced, 1);
        assert_eq!(
            dates(&merged),
            vec![
                "2024-01-10T12:00:00+00:00",
                "2024-01-11T10:00:00+00:00",
                "2024-01-12T10:00:00+00:00",
            ]
        );
    }

    #[test]
    fn test_earlier_reading_is_duplicate() {
        let (merged, summary) = merge(
            vec![metric("2024-01-10T12:00")],
            vec![metric("2024-01-10T08:00")],
        );

        assert_eq!(summary.duplicates, 1);
        assert_eq!(dates(&merged), vec!["2024-01-10T12:00:00+00:00"]);
    }

    #[test]
    fn test_same_day_within_batch_latest_wins() {
        let (merged, summary) = merge(
            vec![],
            vec![
                metric("2024-01-10T09:00"),
                metric("2024-01-10T18:00"),
                metric("2024-01-10T12:00"),
            ],
        );

        assert_eq!(summary.added, 1);
        assert_eq!(summary.replaced, 1);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(dates(&merged), vec!["2024-01-10T18:00:00+00:00"]);
    }

    #[test]
    fn test_recency_across_two_calls() {
        let mut collection = Collection::new();

        let first = collection.merge(vec![metric("2024-01-10T08:00")]);
        assert_eq!(first.added, 1);

        let second = collection.merge(vec![metric("2024-01-10T20:00")]);
        assert_eq!(second.added, 0);
        assert_eq!(second.duplicates, 0);
        assert_eq!(second.replaced, 1);
        assert_eq!(
            dates(collection.records()),
            vec!["2024-01-10T20:00:00+00:00"]
        );
    }

    #[test]
    fn test_import_is_idempotent() {
        let batch = vec![
            metric("2024-01-12T07:00"),
            metric("2024-01-10T07:00"),
            metric("2024-01-11T07:00"),
        ];
        let mut collection = Collection::new();

        let first = collection.merge(batch.clone());
        let after_first = collection.clone();
        let second = collection.merge(batch.clone());

        assert_eq!(first.added, 3);
        assert_eq!(second.added, 0);
        assert_eq!(second.duplicates, batch.len());
        assert_eq!(collection, after_first);
    }

    #[test]
    fn test_same_instant_different_offsets_is_duplicate() {
        let (merged, summary) = merge(
            vec![],
            vec![
                metric("2024-01-10T23:00:00-01:00"),
                metric("2024-01-11T00:00:00+00:00"),
                metric("2024-01-11T09:00:00+09:00"),
            ],
        );

        assert_eq!(summary.added, 1);
        assert_eq!(summary.duplicates, 2);
        assert_eq!(merged.len(), 1);
        assert_eq!(dates(&merged), vec!["2024-01-10T23:00:00-01:00"]);
    }

    #[test]
    fn test_mixed_offsets_stay_strictly_ascending() {
        let (merged, _) = merge(
            vec![metric("2024-01-11T01:00:00+05:00")],
            vec![
                metric("2024-01-10T22:00:00Z"),
                metric("2024-01-10T23:30:00-05:00"),
                metric("2024-01-12T00:30:00+02:00"),
            ],
        );

        assert_sorted_one_per_day(&merged);
    }

    #[test]
    fn test_merge_output_sorted_one_per_day() {
        let existing = vec![
            metric("2024-03-01T07:00"),
            metric("2024-01-15T07:00"),
            metric("2024-02-01T07:00"),
        ];
        let incoming = vec![
            metric("2024-02-01T06:00"),
            metric("2024-01-01"),
            metric("2024-03-01T23:59"),
            metric("2024-02-14T12:00"),
            metric("2024-01-01T00:30"),
        ];

        let (merged, _) = merge(existing, incoming);

        assert_eq!(merged.len(), 5);
        assert_sorted_one_per_day(&merged);
    }

    #[test]
    fn test_insert_single_record() {
        let mut collection = Collection::new();

        assert_eq!(
            collection.insert(metric("2024-01-11T10:00")),
            MergeOutcome::Added
        );
        assert_eq!(
            collection.insert(metric("2024-01-10T10:00")),
            MergeOutcome::Added
        );
        assert_eq!(
            collection.insert(metric("2024-01-10T10:00")),
            MergeOutcome::Duplicate
        );
        assert_eq!(
            collection.insert(metric("2024-01-11T11:00")),
            MergeOutcome::Replaced
        );

        assert_eq!(
            dates(collection.records()),
            vec!["2024-01-10T10:00:00+00:00", "2024-01-11T11:00:00+00:00"]
        );
    }

    #[test]
    fn test_from_records_collapses_same_day() {
        let collection = Collection::from_records(vec![
            metric("2024-01-10T18:00"),
            metric("2024-01-09T08:00"),
            metric("2024-01-10T06:00"),
        ]);

        assert_eq!(collection.len(), 2);
        assert_eq!(
            collection.latest().map(|m| m.date.to_string()),
            Some("2024-01-10T18:00:00+00:00".to_string())
        );
    }

    #[test]
    fn test_deserialize_normalizes_order() {
        let json = r#"[
            {"date": "2024-01-11T10:00", "weight_kg": 80.5},
            {"date": "2024-01-10T10:00", "weight_kg": 81.0}
        ]"#;
        let collection: Collection<BodyMetric> = serde_json::from_str(json).unwrap();
        assert_eq!(collection.records()[0].weight_kg, 81.0);
        assert_sorted_one_per_day(collection.records());
    }

    #[test]
    fn test_summary_display() {
        let summary = ImportSummary {
            added: 3,
            replaced: 1,
            duplicates: 2,
            invalid: 0,
        };
        assert_eq!(
            summary.to_string(),
            "3 added, 2 duplicates skipped, 1 replaced with newer readings"
        );
    }
}
