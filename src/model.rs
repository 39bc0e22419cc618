/// Shared data types for the outbreak watch service.
///
/// Every data source produces `Record`s, one per region, and a complete
/// collection of them is a `Snapshot`. The poll loop compares snapshots
/// through `RecordDiff`s and `Totals`, and decides whether anything changed
/// at all by comparing `Fingerprint`s.

use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Identity of a region across snapshots: (country, province).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegionKey {
    pub country: String,
    /// Empty means the whole country/region.
    pub province: String,
}

/// One region's statistics at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// May be empty (whole country/region).
    pub province: String,
    pub country: String,
    /// Source-reported update time; `None` when the source timestamp was
    /// missing or did not match the expected layout.
    pub last_updated: Option<DateTime<Utc>>,
    pub confirmed_cases: u64,
    pub deaths: u64,
    /// `None` when the source does not report recoveries at all.
    pub recovered: Option<u64>,
}

impl Record {
    /// The (country, province) join key used by the diff engine.
    pub fn key(&self) -> RegionKey {
        RegionKey {
            country: self.country.clone(),
            province: self.province.clone(),
        }
    }

    /// True when `other` describes the same region.
    pub fn same_region(&self, other: &Record) -> bool {
        self.country == other.country && self.province == other.province
    }

    /// Human-readable location, e.g. `"Hubei, China"` or `"Italy"`.
    pub fn location(&self) -> String {
        if self.province.is_empty() {
            self.country.clone()
        } else {
            format!("{}, {}", self.province, self.country)
        }
    }
}

/// One complete set of per-region records from a single collection.
pub type Snapshot = Vec<Record>;

/// Per-region change between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordDiff {
    /// The region was absent from the previous snapshot. Deltas are zero.
    pub added: bool,
    pub delta_cases: i64,
    pub delta_deaths: i64,
    pub delta_recovered: i64,
}

impl RecordDiff {
    /// A region is worth reporting when it is new or any single field moved.
    pub fn is_notable(&self) -> bool {
        self.added || self.delta_cases != 0 || self.delta_deaths != 0 || self.delta_recovered != 0
    }
}

/// Largest count a parser accepts. Anything above degrades to 0.
pub const MAX_COUNT: u64 = i64::MAX as u64;

/// Signed difference `new - old` of two counts, clamped to the `i64` range.
pub fn delta(new: u64, old: u64) -> i64 {
    let exact = i128::from(new) - i128::from(old);
    i64::try_from(exact).unwrap_or(if exact > 0 { i64::MAX } else { i64::MIN })
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// Sums across a whole snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    pub confirmed_cases: u64,
    pub deaths: u64,
    /// `None` when no record in the snapshot reports recoveries.
    pub recovered: Option<u64>,
}

impl Totals {
    /// Saturates at `u64::MAX` rather than wrapping.
    pub fn of(records: &[Record]) -> Self {
        let mut totals = Totals::default();
        for record in records {
            totals.confirmed_cases = totals.confirmed_cases.saturating_add(record.confirmed_cases);
            totals.deaths = totals.deaths.saturating_add(record.deaths);
            if let Some(recovered) = record.recovered {
                totals.recovered = Some(totals.recovered.unwrap_or(0).saturating_add(recovered));
            }
        }
        totals
    }
}

// ---------------------------------------------------------------------------
// Change detection
// ---------------------------------------------------------------------------

/// Identity of one collection, compared cycle to cycle to decide whether a
/// notification is warranted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fingerprint {
    /// SHA-256 (hex) of the raw payload, for structured sources.
    PayloadHash(String),
    /// Aggregate counts, for sources with no stable raw payload.
    Aggregate { confirmed_cases: u64, deaths: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(country: &str, province: &str, cases: u64, recovered: Option<u64>) -> Record {
        Record {
            province: province.to_string(),
            country: country.to_string(),
            last_updated: None,
            confirmed_cases: cases,
            deaths: 1,
            recovered,
        }
    }

    #[test]
    fn test_location_without_province() {
        assert_eq!(record("Italy", "", 2, Some(0)).location(), "Italy");
    }

    #[test]
    fn test_location_with_province() {
        assert_eq!(record("China", "Hubei", 2, Some(0)).location(), "Hubei, China");
    }

    #[test]
    fn test_key_distinguishes_provinces() {
        let a = record("China", "Hubei", 1, None);
        let b = record("China", "Anhui", 1, None);
        assert_ne!(a.key(), b.key());
        assert!(!a.same_region(&b));
        assert!(a.same_region(&a.clone()));
    }

    #[test]
    fn test_totals_skip_unreported_recovered() {
        let records = vec![
            record("China", "Hubei", 100, Some(10)),
            record("Italy", "", 2, None),
        ];
        let totals = Totals::of(&records);
        assert_eq!(totals.confirmed_cases, 102);
        assert_eq!(totals.deaths, 2);
        assert_eq!(totals.recovered, Some(10));
    }

    #[test]
    fn test_totals_all_unreported() {
        let totals = Totals::of(&[record("Global", "", 1200, None)]);
        assert_eq!(totals.recovered, None);
    }

    #[test]
    fn test_delta_can_be_negative() {
        assert_eq!(delta(5, 8), -3);
        assert_eq!(delta(8, 5), 3);
    }

    #[test]
    fn test_delta_keeps_sign_for_huge_counts() {
        assert_eq!(delta(u64::MAX, 0), i64::MAX);
        assert_eq!(delta(0, u64::MAX), i64::MIN);
        assert_eq!(delta(MAX_COUNT, u64::MAX), i64::MIN);
        assert_eq!(delta(MAX_COUNT, 0), i64::MAX);
        assert_eq!(delta(0, MAX_COUNT), -i64::MAX);
    }

    #[test]
    fn test_totals_saturate_instead_of_overflowing() {
        let huge = MAX_COUNT + 1;
        let records = vec![
            record("China", "Hubei", huge, Some(huge)),
            record("Italy", "", huge, Some(huge)),
        ];
        let totals = Totals::of(&records);
        assert_eq!(totals.confirmed_cases, u64::MAX);
        assert_eq!(totals.recovered, Some(u64::MAX));
        assert_eq!(totals.deaths, 2);
    }

    #[test]
    fn test_notable_diff() {
        assert!(!RecordDiff::default().is_notable());
        assert!(RecordDiff { added: true, ..Default::default() }.is_notable());
        assert!(RecordDiff { delta_deaths: -1, ..Default::default() }.is_notable());
    }
}
