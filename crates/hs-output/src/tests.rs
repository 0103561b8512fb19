//! Integration tests for hs-output.

use hs_core::{DelayParams, FleetParams, GeoPoint, NodeId, NodeKind, OrderParams, SimConfig, SimTime};
use hs_demand::OrderSpec;
use hs_network::{NetworkBuilder, NetworkGraph};
use hs_sim::{NoopObserver, Sim, SimBuilder};
use tempfile::TempDir;

use crate::row::{EventLogRow, OrderSummaryRow};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn tmp() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

fn event_row(seq: u64, time_secs: u64) -> EventLogRow {
    EventLogRow {
        seq,
        time_secs,
        unix_time_secs:   1_000 + time_secs as i64,
        event_type:       "dispatch_check",
        subject_ids:      "order:0;truck:0".into(),
        resulting_states: "assigned;en_route".into(),
    }
}

fn summary_row(order_id: u32, delivered: Option<u64>) -> OrderSummaryRow {
    OrderSummaryRow {
        order_id,
        origin:         0,
        destination:    1,
        created_secs:   0,
        deadline_secs:  3_000,
        status:         if delivered.is_some() { "delivered".into() } else { "cancelled:deadline_missed".into() },
        truck_id:       delivered.map(|_| 0),
        delivered_secs: delivered,
        lateness_secs:  delivered.map_or(0, |d| d.saturating_sub(3_000)),
    }
}

/// Warehouse and customer one hour apart, plus an unreachable customer.
fn corridor() -> NetworkGraph {
    let mut b = NetworkBuilder::new();
    b.add_node(GeoPoint::new(50.0, 19.0), NodeKind::Warehouse);
    b.add_node(GeoPoint::new(50.0, 20.0), NodeKind::Customer);
    b.add_node(GeoPoint::new(40.0, 10.0), NodeKind::Customer);
    b.add_link(NodeId(0), NodeId(1), 71_500.0, 3_600);
    b.build().unwrap()
}

/// One delivered order (id 0) and one cancelled for lack of a route (id 1).
fn corridor_sim() -> Sim {
    let config = SimConfig {
        seed:            1,
        horizon_secs:    86_400,
        start_unix_secs: 1_700_000_000,
        fleet:           FleetParams { size: 1, capacity: 10.0, max_drive_secs: 8 * 3_600, rest_secs: 3_600 },
        orders:          OrderParams { rate_per_hour: 0.0, ..OrderParams::default() },
        delay:           DelayParams::zero_variance(),
        ..SimConfig::default()
    };
    let spec = |dest: u32| OrderSpec {
        origin:      NodeId(0),
        destination: NodeId(dest),
        created:     SimTime(0),
        deadline:    SimTime(86_400),
        size:        1.0,
    };
    SimBuilder::new(config)
        .network(corridor())
        .homes(vec![NodeId(0)])
        .orders(vec![spec(1), spec(2)])
        .generate_orders(false)
        .build()
        .unwrap()
}

fn read_csv(path: &std::path::Path) -> (Vec<String>, Vec<csv::StringRecord>) {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    let headers = rdr.headers().unwrap().iter().map(str::to_owned).collect();
    let rows = rdr.records().map(|r| r.unwrap()).collect();
    (headers, rows)
}

// ── Rows ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod row_tests {
    use hs_core::OrderId;
    use hs_schedule::EventKind;

    use super::*;

    #[test]
    fn event_row_offsets_wall_clock() {
        let mut sim = corridor_sim();
        sim.run(&mut NoopObserver).unwrap();
        let delivery = sim
            .log()
            .iter()
            .find(|r| matches!(r.event, EventKind::DeliveryComplete { .. }))
            .unwrap();
        let row = EventLogRow::from_record(delivery, 1_700_000_000);
        assert_eq!(row.time_secs, 3_600);
        assert_eq!(row.unix_time_secs, 1_700_003_600);
        assert_eq!(row.event_type, "delivery_complete");
        assert_eq!(row.subject_ids, delivery.subject_ids());
    }

    #[test]
    fn order_row_from_final_state() {
        let mut sim = corridor_sim();
        sim.run(&mut NoopObserver).unwrap();

        let delivered = OrderSummaryRow::from(sim.fleet().order(OrderId(0)).unwrap());
        assert_eq!(delivered.status, "delivered");
        assert_eq!(delivered.truck_id, Some(0));
        assert_eq!(delivered.delivered_secs, Some(3_600));
        assert_eq!(delivered.lateness_secs, 0);

        let cancelled = OrderSummaryRow::from(sim.fleet().order(OrderId(1)).unwrap());
        assert_eq!(cancelled.status, "cancelled:no_route");
        assert_eq!(cancelled.truck_id, None);
        assert_eq!(cancelled.delivered_secs, None);
    }
}

// ── CSV ───────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod csv_tests {
    use super::*;
    use crate::csv::{CsvWriter, EVENT_LOG_HEADER, ORDER_SUMMARY_HEADER};
    use crate::writer::OutputWriter;

    #[test]
    fn csv_files_created() {
        let dir = tmp();
        let _w = CsvWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("event_log.csv").exists());
        assert!(dir.path().join("order_summary.csv").exists());
    }

    #[test]
    fn csv_headers_correct() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        let (headers, rows) = read_csv(&dir.path().join("event_log.csv"));
        assert_eq!(headers, EVENT_LOG_HEADER);
        assert!(rows.is_empty());

        let (headers, _) = read_csv(&dir.path().join("order_summary.csv"));
        assert_eq!(headers, ORDER_SUMMARY_HEADER);
    }

    #[test]
    fn csv_event_round_trip() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_events(&[event_row(0, 0), event_row(1, 60)]).unwrap();
        w.finish().unwrap();

        let (_, rows) = read_csv(&dir.path().join("event_log.csv"));
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][0], "1");                  // seq
        assert_eq!(&rows[1][1], "60");                 // time_secs
        assert_eq!(&rows[1][2], "1060");               // unix_time_secs
        assert_eq!(&rows[1][3], "dispatch_check");
        assert_eq!(&rows[1][4], "order:0;truck:0");
        assert_eq!(&rows[1][5], "assigned;en_route");
    }

    #[test]
    fn csv_missing_values_are_empty() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_order_summaries(&[summary_row(0, Some(3_500)), summary_row(1, None)]).unwrap();
        w.finish().unwrap();

        let (_, rows) = read_csv(&dir.path().join("order_summary.csv"));
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][6], "0");      // truck_id
        assert_eq!(&rows[0][7], "3500");   // delivered_secs
        assert_eq!(&rows[0][8], "500");    // lateness_secs
        assert_eq!(&rows[1][5], "cancelled:deadline_missed");
        assert_eq!(&rows[1][6], "");
        assert_eq!(&rows[1][7], "");
    }

    #[test]
    fn csv_finish_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }

    #[test]
    fn csv_empty_batch_ok() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_events(&[]).unwrap();
        w.write_order_summaries(&[]).unwrap();
    }

    #[test]
    fn csv_missing_directory_errors() {
        let dir = tmp();
        assert!(CsvWriter::new(&dir.path().join("no/such/dir")).is_err());
    }
}

// ── Export and observer ───────────────────────────────────────────────────────

#[cfg(test)]
mod observer_tests {
    use super::*;
    use crate::csv::CsvWriter;
    use crate::observer::LogOutputObserver;
    use crate::writer::{export, OutputWriter};
    use crate::OutputResult;

    #[test]
    fn observer_writes_every_record_and_order() {
        let mut sim = corridor_sim();
        let dir = tmp();
        let writer = CsvWriter::new(dir.path()).unwrap();
        let mut obs = LogOutputObserver::new(writer, 1_700_000_000).with_batch_size(2);
        sim.run(&mut obs).unwrap();
        assert!(obs.take_error().is_none(), "no write errors expected");
        assert_eq!(obs.rows_written(), sim.log().len() as u64);

        let (_, events) = read_csv(&dir.path().join("event_log.csv"));
        assert_eq!(events.len(), sim.log().len());
        for (row, record) in events.iter().zip(sim.log().iter()) {
            assert_eq!(row[0].parse::<u64>().unwrap(), record.seq);
            assert_eq!(row[1].parse::<u64>().unwrap(), record.time.0);
            assert_eq!(&row[3], record.event_type());
        }

        let (_, orders) = read_csv(&dir.path().join("order_summary.csv"));
        assert_eq!(orders.len(), 2);
        assert_eq!(&orders[0][5], "delivered");
        assert_eq!(&orders[1][5], "cancelled:no_route");
    }

    #[test]
    fn export_matches_live_observer() {
        let dir_live = tmp();
        let mut live = corridor_sim();
        let mut obs = LogOutputObserver::new(CsvWriter::new(dir_live.path()).unwrap(), 0);
        live.run(&mut obs).unwrap();
        assert!(obs.take_error().is_none());

        let dir_after = tmp();
        let mut after = corridor_sim();
        after.run(&mut NoopObserver).unwrap();
        let mut writer = CsvWriter::new(dir_after.path()).unwrap();
        export(&mut writer, after.log(), after.fleet(), 0).unwrap();

        for file in ["event_log.csv", "order_summary.csv"] {
            let a = std::fs::read_to_string(dir_live.path().join(file)).unwrap();
            let b = std::fs::read_to_string(dir_after.path().join(file)).unwrap();
            assert_eq!(a, b, "{file} differs");
        }
    }

    /// Fails every write; counts the attempts.
    #[derive(Default)]
    struct Broken {
        calls: usize,
    }

    impl OutputWriter for Broken {
        fn write_events(&mut self, _rows: &[EventLogRow]) -> OutputResult<()> {
            self.calls += 1;
            Err(std::io::Error::other("disk full").into())
        }

        fn write_order_summaries(&mut self, _rows: &[OrderSummaryRow]) -> OutputResult<()> {
            self.calls += 1;
            Err(std::io::Error::other("still full").into())
        }

        fn finish(&mut self) -> OutputResult<()> {
            Ok(())
        }
    }

    #[test]
    fn observer_keeps_first_error_and_run_succeeds() {
        let mut sim = corridor_sim();
        let mut obs = LogOutputObserver::new(Broken::default(), 0).with_batch_size(1);
        sim.run(&mut obs).unwrap();

        let err = obs.take_error().unwrap();
        assert!(err.to_string().contains("disk full"), "{err}");
        assert!(obs.take_error().is_none());
        assert!(obs.into_writer().calls > 1);
    }
}

// ── SQLite ────────────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "sqlite"))]
mod sqlite_tests {
    use rusqlite::Connection;

    use super::*;
    use crate::observer::LogOutputObserver;
    use crate::sqlite::SqliteWriter;
    use crate::writer::OutputWriter;

    #[test]
    fn sqlite_db_created() {
        let dir = tmp();
        let _w = SqliteWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("output.db").exists());
    }

    #[test]
    fn sqlite_null_for_missing_values() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_order_summaries(&[summary_row(0, Some(3_500)), summary_row(1, None)]).unwrap();
        w.finish().unwrap();

        let conn = Connection::open(dir.path().join("output.db")).unwrap();
        let nulls: i64 = conn
            .query_row("SELECT COUNT(*) FROM order_summary WHERE truck_id IS NULL AND delivered_secs IS NULL", [], |r| r.get(0))
            .unwrap();
        assert_eq!(nulls, 1);
        let lateness: i64 = conn
            .query_row("SELECT lateness_secs FROM order_summary WHERE order_id = 0", [], |r| r.get(0))
            .unwrap();
        assert_eq!(lateness, 500);
    }

    #[test]
    fn sqlite_integration() {
        let mut sim = corridor_sim();
        let dir = tmp();
        let mut obs = LogOutputObserver::new(SqliteWriter::new(dir.path()).unwrap(), 0);
        sim.run(&mut obs).unwrap();
        assert!(obs.take_error().is_none());

        let conn = Connection::open(dir.path().join("output.db")).unwrap();
        let events: i64 = conn.query_row("SELECT COUNT(*) FROM event_log", [], |r| r.get(0)).unwrap();
        assert_eq!(events as usize, sim.log().len());
        let delivered: i64 = conn
            .query_row("SELECT COUNT(*) FROM order_summary WHERE status = 'delivered'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(delivered, 1);
    }
}

// ── Parquet ───────────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "parquet"))]
mod parquet_tests {
    use std::fs::File;

    use parquet::file::reader::{FileReader, SerializedFileReader};

    use super::*;
    use crate::observer::LogOutputObserver;
    use crate::parquet::ParquetWriter;
    use crate::writer::OutputWriter;

    fn row_count(path: &std::path::Path) -> i64 {
        let reader = SerializedFileReader::new(File::open(path).unwrap()).unwrap();
        reader.metadata().file_metadata().num_rows()
    }

    #[test]
    fn parquet_files_created_and_readable() {
        let dir = tmp();
        let mut w = ParquetWriter::new(dir.path()).unwrap();
        w.write_events(&[event_row(0, 0), event_row(1, 5)]).unwrap();
        w.write_order_summaries(&[summary_row(0, None)]).unwrap();
        w.finish().unwrap();

        assert_eq!(row_count(&dir.path().join("event_log.parquet")), 2);
        assert_eq!(row_count(&dir.path().join("order_summary.parquet")), 1);
    }

    #[test]
    fn parquet_finish_idempotent() {
        let dir = tmp();
        let mut w = ParquetWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }

    #[test]
    fn parquet_integration() {
        let mut sim = corridor_sim();
        let dir = tmp();
        let mut obs = LogOutputObserver::new(ParquetWriter::new(dir.path()).unwrap(), 0);
        sim.run(&mut obs).unwrap();
        assert!(obs.take_error().is_none());
        assert_eq!(row_count(&dir.path().join("event_log.parquet")), sim.log().len() as i64);
        assert_eq!(row_count(&dir.path().join("order_summary.parquet")), 2);
    }
}
