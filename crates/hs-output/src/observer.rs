//! `LogOutputObserver<W>` — bridges `SimObserver` to an `OutputWriter`.

use tracing::{debug, warn};

use hs_core::SimTime;
use hs_fleet::FleetStore;
use hs_sim::{LogRecord, SimObserver};

use crate::row::{EventLogRow, OrderSummaryRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// Rows buffered before a write, unless overridden.
pub const DEFAULT_BATCH: usize = 1_024;

/// A [`SimObserver`] that streams event-log rows to any [`OutputWriter`]
/// backend and writes one summary row per order when the run ends.
///
/// Rows are buffered and written in batches of `batch_size`.  `on_run_end`
/// flushes the buffer, writes the order summaries, and finishes the writer,
/// so use one observer per run.
///
/// Errors from the writer are stored internally because `SimObserver` methods
/// have no return value.  After `sim.run()` returns, check for errors with
/// [`take_error`][Self::take_error].
pub struct LogOutputObserver<W: OutputWriter> {
    writer:          W,
    start_unix_secs: i64,
    batch_size:      usize,
    buffer:          Vec<EventLogRow>,
    written:         u64,
    last_error:      Option<OutputError>,
}

impl<W: OutputWriter> LogOutputObserver<W> {
    /// `start_unix_secs` maps simulated seconds to wall-clock timestamps.
    pub fn new(writer: W, start_unix_secs: i64) -> Self {
        Self {
            writer,
            start_unix_secs,
            batch_size: DEFAULT_BATCH,
            buffer:     Vec::with_capacity(DEFAULT_BATCH),
            written:    0,
            last_error: None,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Take the stored write error (if any) after `sim.run()` returns.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Event rows handed to the writer so far.
    pub fn rows_written(&self) -> u64 {
        self.written
    }

    /// Unwrap the inner writer (e.g. to inspect files after the sim).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let result = self.writer.write_events(&self.buffer);
        self.written += self.buffer.len() as u64;
        self.buffer.clear();
        self.store_err(result);
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                warn!(error = %e, "output write failed");
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for LogOutputObserver<W> {
    fn on_event(&mut self, record: &LogRecord) {
        self.buffer.push(EventLogRow::from_record(record, self.start_unix_secs));
        if self.buffer.len() >= self.batch_size {
            self.flush();
        }
    }

    fn on_run_end(&mut self, now: SimTime, fleet: &FleetStore) {
        self.flush();
        let orders: Vec<OrderSummaryRow> = fleet.orders().map(OrderSummaryRow::from).collect();
        let result = self.writer.write_order_summaries(&orders);
        self.store_err(result);
        let result = self.writer.finish();
        self.store_err(result);
        debug!(events = self.written, orders = orders.len(), final_time = %now, "output finished");
    }
}
