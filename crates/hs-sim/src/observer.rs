//! Simulation observer trait for progress reporting and data collection.

use hs_core::SimTime;
use hs_fleet::FleetStore;

use crate::LogRecord;

/// Callbacks invoked by the engine as it processes events.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: progress printer
///
/// ```rust,ignore
/// struct Progress { every: usize, seen: usize }
///
/// impl SimObserver for Progress {
///     fn on_event(&mut self, record: &LogRecord) {
///         self.seen += 1;
///         if self.seen % self.every == 0 {
///             println!("{} events, t={}", self.seen, record.time);
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called once per processed event, right after its record is appended
    /// to the log.
    fn on_event(&mut self, _record: &LogRecord) {}

    /// Called when a `run` / `run_until` call returns successfully.
    ///
    /// `fleet` gives read-only access to every truck and order so output
    /// writers can record final summaries.
    fn on_run_end(&mut self, _now: SimTime, _fleet: &FleetStore) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}

/// Keeps a copy of every record it sees.
#[derive(Default)]
pub struct CollectingObserver {
    pub records: Vec<LogRecord>,
    pub ended:   Option<SimTime>,
}

impl SimObserver for CollectingObserver {
    fn on_event(&mut self, record: &LogRecord) {
        self.records.push(record.clone());
    }

    fn on_run_end(&mut self, now: SimTime, _fleet: &FleetStore) {
        self.ended = Some(now);
    }
}
