/// Notification text for one changed cycle.
///
/// A report holds one segment per notable region (new, or any count moved)
/// in snapshot order, followed by a summary of snapshot-wide totals. Text is
/// ready for MarkdownV2: every piece of data and literal text goes through
/// `escape_markdown`, and only the renderer's own `*bold*` markers are left
/// bare.

use chrono::{DateTime, Utc};

use crate::analysis::diff_records;
use crate::model::{delta, Record, RecordDiff, Totals};
use crate::notify::escape_markdown;

pub const DEFAULT_TITLE: &str = "Coronavirus Updates";

/// e.g. `Jan 22, 2020 @ 17:00`
const LAST_UPDATED_FORMAT: &str = "%b %-d, %Y @ %H:%M";

/// Rendered messages for one cycle, in send order.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub region_updates: Vec<String>,
    pub summary: String,
}

impl Report {
    /// Region segments first, then the summary.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.region_updates
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.summary.as_str()))
    }
}

/// Builds the report for `current`. Region segments are only produced when
/// there is a `previous` snapshot to diff against; without one the summary
/// deltas are all zero.
pub fn build_report(previous: Option<&[Record]>, current: &[Record], title: &str) -> Report {
    let region_updates = match previous {
        Some(previous) => diff_records(previous, current)
            .iter()
            .zip(current)
            .filter(|(diff, _)| diff.is_notable())
            .map(|(diff, record)| render_region_update(record, diff))
            .collect(),
        None => Vec::new(),
    };

    let totals = Totals::of(current);
    let previous_totals = previous.map(Totals::of).unwrap_or(totals);
    let last_updated = current.iter().filter_map(|r| r.last_updated).max();

    Report {
        region_updates,
        summary: render_summary(title, &totals, &previous_totals, last_updated),
    }
}

/// One region's segment.
pub fn render_region_update(record: &Record, diff: &RecordDiff) -> String {
    let mut lines = Vec::new();
    if diff.added {
        lines.push("⚠ *New Outbreak* ⚠".to_string());
    }
    lines.push(escape_markdown(&format!("Update for {}", record.location())));
    lines.push(escape_markdown(&format!(
        "Cases: {}{}",
        record.confirmed_cases,
        change(diff.delta_cases)
    )));
    lines.push(escape_markdown(&format!("Deaths: {}{}", record.deaths, change(diff.delta_deaths))));
    if let Some(recovered) = record.recovered {
        lines.push(escape_markdown(&format!(
            "Recovered: {}{}",
            recovered,
            change(diff.delta_recovered)
        )));
    }
    lines.join("\n")
}

/// Snapshot-wide totals with signed deltas versus the previous totals.
pub fn render_summary(
    title: &str,
    totals: &Totals,
    previous: &Totals,
    last_updated: Option<DateTime<Utc>>,
) -> String {
    let mut lines = vec![
        format!("❗{}❗", bold(title)),
        String::new(),
        bold(&format!(
            "Total Cases: {} ({:+})",
            totals.confirmed_cases,
            delta(totals.confirmed_cases, previous.confirmed_cases)
        )),
        bold(&format!(
            "Total Deaths: {} ({:+})",
            totals.deaths,
            delta(totals.deaths, previous.deaths)
        )),
    ];

    if let Some(recovered) = totals.recovered {
        lines.push(bold(&format!(
            "Total Recovered: {} ({:+})",
            recovered,
            delta(recovered, previous.recovered.unwrap_or(0))
        )));
    }

    if let Some(ts) = last_updated {
        lines.push(bold(&format!("Last Updated: {}", ts.format(LAST_UPDATED_FORMAT))));
    }

    lines.join("\n")
}

fn bold(text: &str) -> String {
    format!("*{}*", escape_markdown(text))
}

/// ` (+20)` for a non-zero delta, nothing otherwise.
fn change(delta: i64) -> String {
    if delta == 0 {
        String::new()
    } else {
        format!(" ({:+})", delta)
    }
}
