/// outbreak_watch: polls public outbreak statistics and posts what changed.
///
/// # Module structure
///
/// ```text
/// outbreak_watch
/// ├── model       — shared data types (Record, RecordDiff, Totals, Fingerprint)
/// ├── error       — FetchError, NotifyError, StateError, ConfigError, PollError
/// ├── config      — settings file (outbreak_watch.toml) + environment credentials
/// ├── ingest
/// │   ├── spreadsheet — CSV case table: row parser, snapshot reader, source
/// │   ├── scraped     — news page: landmark search, sentence extraction, source
/// │   └── fixtures (test only) — representative payloads
/// ├── analysis
/// │   └── diff    — per-region deltas between snapshots
/// ├── report      — notification text for a changed cycle
/// ├── notify      — Notifier trait, MarkdownV2 escaping, Telegram transport
/// ├── state       — single last-known-state blob on disk
/// └── daemon      — poll loop (fetch, change detection, report, commit)
/// ```

pub mod analysis;
pub mod config;
pub mod daemon;
pub mod error;
pub mod ingest;
pub mod model;
pub mod notify;
pub mod report;
pub mod state;
