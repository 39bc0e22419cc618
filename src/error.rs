/// Error types for the outbreak watch service.
///
/// Malformed fields inside a payload are not errors at all: the parsers
/// degrade them to zero values. Likewise a scraped page without the
/// expected landmark is an empty collection, not a failure.

use thiserror::Error;

/// Network/transport failure while fetching a data source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Failure handing a message to the notifier.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notifier transport error: {0}")]
    Transport(String),

    #[error("notifier rejected message: {0}")]
    Rejected(String),
}

/// Failure reading or writing the last-known state blob.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("state file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Startup configuration problem. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

/// Why a poll cycle was aborted. The retained last-known state is never
/// touched when one of these is returned.
#[derive(Debug, Error)]
pub enum PollError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    State(#[from] StateError),
}
