/// Change analysis for the outbreak watch service.
///
/// Submodules:
/// - `diff` — per-region deltas between two snapshots.

pub mod diff;

pub use diff::diff_records;
