/// Data sources: where outbreak statistics come from.
///
/// Each source gets its own file under `ingest/`:
/// - `spreadsheet` — CSV export of a per-region table
/// - `scraped`     — single global figure pulled out of a news page
///
/// New sources implement `DataSource`; the poll loop only talks to the trait.

use sha2::{Digest, Sha256};

use crate::error::FetchError;
use crate::model::{Fingerprint, Record, Snapshot};

pub mod scraped;
pub mod spreadsheet;

#[cfg(test)]
pub(crate) mod fixtures;

// ---------------------------------------------------------------------------
// Data source capability set
// ---------------------------------------------------------------------------

/// Baseline the poll loop compares new collections against.
#[derive(Debug, Clone, PartialEq)]
pub struct LastKnown {
    pub fingerprint: Fingerprint,
    pub snapshot: Snapshot,
}

/// A remote location that yields outbreak records.
pub trait DataSource {
    /// Fetch the remote payload and rebuild `records()`. On error the
    /// previously collected records are kept as they were.
    fn collect(&mut self) -> Result<(), FetchError>;

    /// Records from the most recent successful `collect`.
    fn records(&self) -> &[Record];

    /// Location this source fetches from.
    fn url(&self) -> &str;

    /// Identity of the most recent collection, or `None` if it yielded no
    /// data (e.g. the scraped landmark was missing).
    fn fingerprint(&self) -> Option<Fingerprint>;

    /// Bytes to persist as the new last-known state after a changed cycle.
    fn persisted_state(&self) -> Option<Vec<u8>>;

    /// Rebuild a baseline from bytes previously returned by `persisted_state`.
    fn restore(&self, blob: &[u8]) -> Option<LastKnown>;
}

/// SHA-256 of a payload as lowercase hex.
pub fn payload_hash(payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Network fetch collaborator
// ---------------------------------------------------------------------------

/// `GET(url) -> bytes`. Any non-success outcome is a `FetchError`.
pub trait Fetch {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Blocking reqwest client. No timeout: requests complete or fail outright.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(None)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let transport = |e: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().map_err(transport)?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().map_err(transport)?;
        Ok(body.to_vec())
    }
}

impl<F: Fetch + ?Sized> Fetch for Box<F> {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        (**self).get(url)
    }
}
