//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `event_log.csv`
//! - `order_summary.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{EventLogRow, OrderSummaryRow, OutputResult};

pub const EVENT_LOG_HEADER: [&str; 6] =
    ["seq", "time_secs", "unix_time_secs", "event_type", "subject_ids", "resulting_states"];

pub const ORDER_SUMMARY_HEADER: [&str; 9] = [
    "order_id",
    "origin",
    "destination",
    "created_secs",
    "deadline_secs",
    "status",
    "truck_id",
    "delivered_secs",
    "lateness_secs",
];

/// Writes simulation output to two CSV files.  Missing values are empty
/// fields.
pub struct CsvWriter {
    events:   Writer<File>,
    orders:   Writer<File>,
    finished: bool,
}

impl CsvWriter {
    /// Open (or create) the two CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut events = Writer::from_path(dir.join("event_log.csv"))?;
        events.write_record(EVENT_LOG_HEADER)?;

        let mut orders = Writer::from_path(dir.join("order_summary.csv"))?;
        orders.write_record(ORDER_SUMMARY_HEADER)?;

        Ok(Self { events, orders, finished: false })
    }
}

fn opt<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

impl OutputWriter for CsvWriter {
    fn write_events(&mut self, rows: &[EventLogRow]) -> OutputResult<()> {
        for row in rows {
            self.events.write_record([
                row.seq.to_string().as_str(),
                row.time_secs.to_string().as_str(),
                row.unix_time_secs.to_string().as_str(),
                row.event_type,
                row.subject_ids.as_str(),
                row.resulting_states.as_str(),
            ])?;
        }
        Ok(())
    }

    fn write_order_summaries(&mut self, rows: &[OrderSummaryRow]) -> OutputResult<()> {
        for row in rows {
            self.orders.write_record(&[
                row.order_id.to_string(),
                row.origin.to_string(),
                row.destination.to_string(),
                row.created_secs.to_string(),
                row.deadline_secs.to_string(),
                row.status.clone(),
                opt(row.truck_id),
                opt(row.delivered_secs),
                row.lateness_secs.to_string(),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.events.flush()?;
        self.orders.flush()?;
        Ok(())
    }
}
