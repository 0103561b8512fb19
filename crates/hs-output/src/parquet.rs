//! Parquet output backend (feature `parquet`).
//!
//! Creates two files in the configured output directory:
//! - `event_log.parquet`
//! - `order_summary.parquet`

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Int64Builder, StringBuilder, UInt32Builder, UInt64Builder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::writer::OutputWriter;
use crate::{EventLogRow, OrderSummaryRow, OutputResult};

fn event_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("seq",              DataType::UInt64, false),
        Field::new("time_secs",        DataType::UInt64, false),
        Field::new("unix_time_secs",   DataType::Int64,  false),
        Field::new("event_type",       DataType::Utf8,   false),
        Field::new("subject_ids",      DataType::Utf8,   false),
        Field::new("resulting_states", DataType::Utf8,   false),
    ]))
}

fn order_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("order_id",       DataType::UInt32, false),
        Field::new("origin",         DataType::UInt32, false),
        Field::new("destination",    DataType::UInt32, false),
        Field::new("created_secs",   DataType::UInt64, false),
        Field::new("deadline_secs",  DataType::UInt64, false),
        Field::new("status",         DataType::Utf8,   false),
        Field::new("truck_id",       DataType::UInt32, true),
        Field::new("delivered_secs", DataType::UInt64, true),
        Field::new("lateness_secs",  DataType::UInt64, false),
    ]))
}

fn snappy_props() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build()
}

/// Writes simulation output to two Parquet files.
///
/// `finish()` **must** be called to write the Parquet file footer; files
/// written without calling `finish()` cannot be opened by Parquet readers.
pub struct ParquetWriter {
    events:       Option<ArrowWriter<File>>,
    orders:       Option<ArrowWriter<File>>,
    event_schema: Arc<Schema>,
    order_schema: Arc<Schema>,
}

impl ParquetWriter {
    /// Create both Parquet files in `dir`.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let event_schema = event_schema();
        let order_schema = order_schema();

        let events = ArrowWriter::try_new(
            File::create(dir.join("event_log.parquet"))?,
            Arc::clone(&event_schema),
            Some(snappy_props()),
        )?;
        let orders = ArrowWriter::try_new(
            File::create(dir.join("order_summary.parquet"))?,
            Arc::clone(&order_schema),
            Some(snappy_props()),
        )?;

        Ok(Self { events: Some(events), orders: Some(orders), event_schema, order_schema })
    }
}

impl OutputWriter for ParquetWriter {
    fn write_events(&mut self, rows: &[EventLogRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let Some(writer) = self.events.as_mut() else {
            return Ok(());
        };

        let mut seqs   = UInt64Builder::new();
        let mut times  = UInt64Builder::new();
        let mut unix   = Int64Builder::new();
        let mut kinds  = StringBuilder::new();
        let mut subjs  = StringBuilder::new();
        let mut states = StringBuilder::new();

        for row in rows {
            seqs.append_value(row.seq);
            times.append_value(row.time_secs);
            unix.append_value(row.unix_time_secs);
            kinds.append_value(row.event_type);
            subjs.append_value(&row.subject_ids);
            states.append_value(&row.resulting_states);
        }

        let batch = RecordBatch::try_new(
            Arc::clone(&self.event_schema),
            vec![
                Arc::new(seqs.finish()),
                Arc::new(times.finish()),
                Arc::new(unix.finish()),
                Arc::new(kinds.finish()),
                Arc::new(subjs.finish()),
                Arc::new(states.finish()),
            ],
        )?;
        writer.write(&batch)?;
        Ok(())
    }

    fn write_order_summaries(&mut self, rows: &[OrderSummaryRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let Some(writer) = self.orders.as_mut() else {
            return Ok(());
        };

        let mut ids        = UInt32Builder::new();
        let mut origins    = UInt32Builder::new();
        let mut dests      = UInt32Builder::new();
        let mut created    = UInt64Builder::new();
        let mut deadlines  = UInt64Builder::new();
        let mut statuses   = StringBuilder::new();
        let mut trucks     = UInt32Builder::new();
        let mut delivered  = UInt64Builder::new();
        let mut lateness   = UInt64Builder::new();

        for row in rows {
            ids.append_value(row.order_id);
            origins.append_value(row.origin);
            dests.append_value(row.destination);
            created.append_value(row.created_secs);
            deadlines.append_value(row.deadline_secs);
            statuses.append_value(&row.status);
            trucks.append_option(row.truck_id);
            delivered.append_option(row.delivered_secs);
            lateness.append_value(row.lateness_secs);
        }

        let batch = RecordBatch::try_new(
            Arc::clone(&self.order_schema),
            vec![
                Arc::new(ids.finish()),
                Arc::new(origins.finish()),
                Arc::new(dests.finish()),
                Arc::new(created.finish()),
                Arc::new(deadlines.finish()),
                Arc::new(statuses.finish()),
                Arc::new(trucks.finish()),
                Arc::new(delivered.finish()),
                Arc::new(lateness.finish()),
            ],
        )?;
        writer.write(&batch)?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if let Some(w) = self.events.take() {
            w.close()?;
        }
        if let Some(w) = self.orders.take() {
            w.close()?;
        }
        Ok(())
    }
}
