//! The `OutputWriter` trait implemented by all backend writers.

use hs_fleet::FleetStore;
use hs_sim::EventLog;

use crate::{EventLogRow, OrderSummaryRow, OutputResult};

/// Trait implemented by CSV, SQLite, and Parquet writers.
pub trait OutputWriter {
    /// Append a batch of event-log rows, in log order.
    fn write_events(&mut self, rows: &[EventLogRow]) -> OutputResult<()>;

    /// Append a batch of order summaries.
    fn write_order_summaries(&mut self, rows: &[OrderSummaryRow]) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent: safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}

/// Write a finished run in one go: every log record, then one summary per
/// order, then `finish`.
pub fn export<W: OutputWriter>(
    writer:          &mut W,
    log:             &EventLog,
    fleet:           &FleetStore,
    start_unix_secs: i64,
) -> OutputResult<()> {
    let events: Vec<EventLogRow> = log
        .iter()
        .map(|r| EventLogRow::from_record(r, start_unix_secs))
        .collect();
    writer.write_events(&events)?;
    let orders: Vec<OrderSummaryRow> = fleet.orders().map(OrderSummaryRow::from).collect();
    writer.write_order_summaries(&orders)?;
    writer.finish()
}
