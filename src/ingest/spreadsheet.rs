/// Spreadsheet source: a CSV export with one row per region.
///
/// Expected columns, in order:
///   province, country, last update, confirmed, deaths, recovered
///
/// Third-party feeds are sloppy, so parsing is permissive. A bad timestamp
/// becomes `None`, and a blank or malformed count becomes `0`. Neither
/// aborts the row, and one bad row never aborts the snapshot.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, warn};

use super::{payload_hash, DataSource, Fetch, HttpFetcher, LastKnown};
use crate::error::FetchError;
use crate::model::{Fingerprint, Record, Snapshot, MAX_COUNT};

/// Johns Hopkins case table, exported as CSV.
pub const DEFAULT_SPREADSHEET_URL: &str =
    "https://docs.google.com/spreadsheets/d/1yZv9w9zRKwrGTaR-YzmAqMefw4wMlaXocejdxZaTs6w/export?format=csv";

/// Layout of the "Last Update" column, e.g. `1/22/2020 17:00`.
const LAST_UPDATE_FORMAT: &str = "%m/%d/%Y %H:%M";

// ---------------------------------------------------------------------------
// Row parser
// ---------------------------------------------------------------------------

/// Parses one row of fields into a `Record`. Missing trailing fields are
/// treated as empty.
pub fn parse_row<S: AsRef<str>>(row: &[S]) -> Record {
    let field = |idx: usize| row.get(idx).map(|s| s.as_ref()).unwrap_or("");

    Record {
        province: field(0).to_string(),
        country: field(1).to_string(),
        last_updated: parse_last_update(field(2)),
        confirmed_cases: parse_count(field(3)),
        deaths: parse_count(field(4)),
        recovered: Some(parse_count(field(5))),
    }
}

fn parse_last_update(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), LAST_UPDATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Blank, malformed or out-of-range counts degrade to 0. Surrounding
/// whitespace is ignored.
fn parse_count(raw: &str) -> u64 {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|count| *count <= MAX_COUNT)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Snapshot reader
// ---------------------------------------------------------------------------

/// Reads a full CSV payload (header row + data rows) into records, in row
/// order. A header-only or empty payload yields an empty snapshot.
pub fn read_records(payload: &[u8]) -> Snapshot {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(payload);

    let mut records = Vec::new();
    for (idx, row) in reader.byte_records().enumerate() {
        match row {
            Ok(row) => {
                let fields: Vec<String> = row
                    .iter()
                    .map(|f| String::from_utf8_lossy(f).into_owned())
                    .collect();
                records.push(parse_row(&fields));
            }
            Err(e) => {
                warn!(row = idx + 1, error = %e, "stopped reading spreadsheet payload");
                break;
            }
        }
    }

    records
}

// ---------------------------------------------------------------------------
// Data source
// ---------------------------------------------------------------------------

/// Structured source backed by a CSV endpoint.
pub struct SpreadsheetSource<F: Fetch = HttpFetcher> {
    fetcher: F,
    url: String,
    payload: Option<Vec<u8>>,
    records: Snapshot,
}

impl SpreadsheetSource<HttpFetcher> {
    /// Source for the default case table over HTTP.
    pub fn new() -> Result<Self, FetchError> {
        Ok(Self::with_fetcher(HttpFetcher::new()?, DEFAULT_SPREADSHEET_URL))
    }
}

impl<F: Fetch> SpreadsheetSource<F> {
    pub fn with_fetcher(fetcher: F, url: impl Into<String>) -> Self {
        Self {
            fetcher,
            url: url.into(),
            payload: None,
            records: Vec::new(),
        }
    }
}

impl<F: Fetch> DataSource for SpreadsheetSource<F> {
    fn collect(&mut self) -> Result<(), FetchError> {
        let payload = self.fetcher.get(&self.url)?;
        self.records = read_records(&payload);
        debug!(
            url = %self.url,
            bytes = payload.len(),
            rows = self.records.len(),
            "collected spreadsheet"
        );
        self.payload = Some(payload);
        Ok(())
    }

    fn records(&self) -> &[Record] {
        &self.records
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn fingerprint(&self) -> Option<Fingerprint> {
        self.payload
            .as_deref()
            .map(|payload| Fingerprint::PayloadHash(payload_hash(payload)))
    }

    fn persisted_state(&self) -> Option<Vec<u8>> {
        self.payload.clone()
    }

    fn restore(&self, blob: &[u8]) -> Option<LastKnown> {
        Some(LastKnown {
            fingerprint: Fingerprint::PayloadHash(payload_hash(blob)),
            snapshot: read_records(blob),
        })
    }
}
