//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `output.db` file in the configured output directory with
//! two tables: `event_log` and `order_summary`.

use std::path::Path;

use rusqlite::Connection;

use crate::writer::OutputWriter;
use crate::{EventLogRow, OrderSummaryRow, OutputResult};

/// Writes simulation output to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `output.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("output.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS event_log (
                 seq              INTEGER PRIMARY KEY,
                 time_secs        INTEGER NOT NULL,
                 unix_time_secs   INTEGER NOT NULL,
                 event_type       TEXT    NOT NULL,
                 subject_ids      TEXT    NOT NULL,
                 resulting_states TEXT    NOT NULL
             );
             CREATE TABLE IF NOT EXISTS order_summary (
                 order_id       INTEGER PRIMARY KEY,
                 origin         INTEGER NOT NULL,
                 destination    INTEGER NOT NULL,
                 created_secs   INTEGER NOT NULL,
                 deadline_secs  INTEGER NOT NULL,
                 status         TEXT    NOT NULL,
                 truck_id       INTEGER,
                 delivered_secs INTEGER,
                 lateness_secs  INTEGER NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_events(&mut self, rows: &[EventLogRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO event_log \
                 (seq, time_secs, unix_time_secs, event_type, subject_ids, resulting_states) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.seq as i64,
                    row.time_secs as i64,
                    row.unix_time_secs,
                    row.event_type,
                    row.subject_ids,
                    row.resulting_states,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_order_summaries(&mut self, rows: &[OrderSummaryRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO order_summary \
                 (order_id, origin, destination, created_secs, deadline_secs, \
                  status, truck_id, delivered_secs, lateness_secs) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.order_id,
                    row.origin,
                    row.destination,
                    row.created_secs as i64,
                    row.deadline_secs as i64,
                    row.status,
                    row.truck_id,
                    row.delivered_secs.map(|t| t as i64),
                    row.lateness_secs as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
