/// Poll loop for the outbreak watch service.
///
/// Each cycle:
/// 1. Collects from the configured data source
/// 2. Compares the collection's fingerprint against the last-known one
/// 3. On change: persists the new state, diffs against the previous
///    snapshot, and sends one message per notable region plus a summary
///
/// A fetch failure ends that cycle only and leaves the last-known state as
/// it was. State is committed before any message goes out, so a notifier
/// failure cannot undo it.
///
/// The daemon owns all mutable state (baseline, stats) and reaches the
/// outside world only through the `DataSource`, `Notifier` and `StateStore`
/// traits.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::error::PollError;
use crate::ingest::{DataSource, LastKnown};
use crate::notify::{Notifier, RenderMode};
use crate::report::{build_report, DEFAULT_TITLE};
use crate::state::StateStore;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// How often to poll the data source (default: 15 minutes)
    pub poll_interval_minutes: u64,

    /// Notification channel identifier
    pub channel: String,

    /// Heading of the summary message
    pub title: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            poll_interval_minutes: 15,
            channel: String::new(),
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Cycle bookkeeping
// ---------------------------------------------------------------------------

/// Where the poll loop is within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Idle,
    Fetching,
    Unchanged,
    Changed,
    Reporting,
}

/// Result of one successful cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Same fingerprint as the last-known state. Nothing sent.
    Unchanged,
    /// The source yielded no records (e.g. landmark missing). Nothing sent.
    NoData,
    /// State committed and messages handed to the notifier.
    Reported {
        messages_sent: usize,
        notify_failures: usize,
    },
}

/// Polling history, kept in memory only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollStats {
    pub polls_attempted: u64,
    pub last_poll_attempted: Option<DateTime<Utc>>,
    pub last_change: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
}

// ---------------------------------------------------------------------------
// Daemon State
// ---------------------------------------------------------------------------

/// Main daemon state
pub struct Daemon {
    config: DaemonConfig,
    source: Box<dyn DataSource>,
    notifier: Box<dyn Notifier>,
    store: Box<dyn StateStore>,
    last_known: Option<LastKnown>,
    phase: PollPhase,
    stats: PollStats,
}

impl Daemon {
    pub fn new(
        config: DaemonConfig,
        source: Box<dyn DataSource>,
        notifier: Box<dyn Notifier>,
        store: Box<dyn StateStore>,
    ) -> Self {
        Self {
            config,
            source,
            notifier,
            store,
            last_known: None,
            phase: PollPhase::Idle,
            stats: PollStats::default(),
        }
    }

    /// Restores the last-known state from the store. A missing blob means a
    /// fresh start; an unreadable one is logged and ignored.
    pub fn initialize(&mut self) -> Result<(), PollError> {
        match self.store.load()? {
            Some(blob) => match self.source.restore(&blob) {
                Some(last_known) => {
                    info!(regions = last_known.snapshot.len(), "restored last-known state");
                    self.last_known = Some(last_known);
                }
                None => warn!(bytes = blob.len(), "ignoring unreadable last-known state"),
            },
            None => info!("no last-known state, starting fresh"),
        }
        Ok(())
    }

    pub fn config(&self) -> &DaemonConfig {
        &self.config
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    pub fn stats(&self) -> &PollStats {
        &self.stats
    }

    pub fn last_known(&self) -> Option<&LastKnown> {
        self.last_known.as_ref()
    }

    fn enter(&mut self, phase: PollPhase) {
        debug!(from = ?self.phase, to = ?phase, "poll phase");
        self.phase = phase;
    }

    /// Runs one full cycle. Always leaves the daemon `Idle`.
    pub fn poll_once(&mut self) -> Result<PollOutcome, PollError> {
        self.stats.polls_attempted += 1;
        self.stats.last_poll_attempted = Some(Utc::now());

        let result = self.cycle();
        match &result {
            Ok(_) => self.stats.consecutive_failures = 0,
            Err(_) => self.stats.consecutive_failures += 1,
        }
        self.enter(PollPhase::Idle);
        result
    }

    fn cycle(&mut self) -> Result<PollOutcome, PollError> {
        self.enter(PollPhase::Fetching);
        self.source.collect()?;

        let Some(fingerprint) = self.source.fingerprint() else {
            info!(url = %self.source.url(), "no data extracted this cycle");
            return Ok(PollOutcome::NoData);
        };

        if self.last_known.as_ref().map(|lk| &lk.fingerprint) == Some(&fingerprint) {
            self.enter(PollPhase::Unchanged);
            debug!(?fingerprint, "source unchanged");
            return Ok(PollOutcome::Unchanged);
        }

        self.enter(PollPhase::Changed);
        info!(?fingerprint, "new update");

        if let Some(blob) = self.source.persisted_state() {
            self.store.save(&blob)?;
        }

        let snapshot = self.source.records().to_vec();
        let previous = self.last_known.as_ref().map(|lk| lk.snapshot.as_slice());
        let report = build_report(previous, &snapshot, &self.config.title);

        self.last_known = Some(LastKnown { fingerprint, snapshot });
        self.stats.last_change = Some(Utc::now());

        self.enter(PollPhase::Reporting);
        let mut messages_sent = 0;
        let mut notify_failures = 0;
        for message in report.messages() {
            match self.notifier.send(&self.config.channel, message, RenderMode::MarkdownV2) {
                Ok(()) => messages_sent += 1,
                Err(e) => {
                    error!(error = %e, "failed to send notification");
                    notify_failures += 1;
                }
            }
        }

        Ok(PollOutcome::Reported {
            messages_sent,
            notify_failures,
        })
    }

    fn log_outcome(&self, result: &Result<PollOutcome, PollError>) {
        match result {
            Ok(PollOutcome::Reported { messages_sent, notify_failures }) => {
                info!(messages_sent, notify_failures, "poll complete: update reported");
            }
            Ok(outcome) => info!(?outcome, "poll complete"),
            Err(e) => error!(
                error = %e,
                consecutive_failures = self.stats.consecutive_failures,
                "poll failed"
            ),
        }
    }

    /// Main daemon loop. Polls immediately, then once per interval until
    /// `shutdown` is set. A cycle in flight always finishes first.
    pub fn run(&mut self, shutdown: &AtomicBool) {
        let interval = Duration::from_secs(self.config.poll_interval_minutes * 60);
        info!(
            url = %self.source.url(),
            interval_minutes = self.config.poll_interval_minutes,
            "poll loop starting"
        );

        while !shutdown.load(Ordering::SeqCst) {
            let start = Instant::now();
            let result = self.poll_once();
            self.log_outcome(&result);

            // Sleep until next poll interval
            let deadline = start + interval;
            while !shutdown.load(Ordering::SeqCst) {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                std::thread::sleep((deadline - now).min(Duration::from_secs(1)));
            }
        }

        info!("poll loop stopped");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
