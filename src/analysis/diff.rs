/// Snapshot comparison.
///
/// `diff_records` pairs each record in the new snapshot with the record for
/// the same region in the old one. The join is a linear scan per record; if
/// the old snapshot repeats a key, the first occurrence wins.
///
/// Output order follows the new snapshot. Regions that disappeared produce
/// no entry.

use crate::model::{delta, Record, RecordDiff};

/// One `RecordDiff` per record in `new_records`, in `new_records` order.
pub fn diff_records(old_records: &[Record], new_records: &[Record]) -> Vec<RecordDiff> {
    new_records
        .iter()
        .map(|new| match old_records.iter().find(|old| old.same_region(new)) {
            Some(old) => diff_pair(old, new),
            None => RecordDiff {
                added: true,
                ..RecordDiff::default()
            },
        })
        .collect()
}

fn diff_pair(old: &Record, new: &Record) -> RecordDiff {
    RecordDiff {
        added: false,
        delta_cases: delta(new.confirmed_cases, old.confirmed_cases),
        delta_deaths: delta(new.deaths, old.deaths),
        delta_recovered: match (new.recovered, old.recovered) {
            (Some(n), Some(o)) => delta(n, o),
            _ => 0,
        },
    }
}
