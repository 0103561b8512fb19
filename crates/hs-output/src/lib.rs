//! `hs-output` — event-log writers for haulsim.
//!
//! Three backends are provided behind Cargo features:
//!
//! | Feature   | Backend     | Files created                                   |
//! |-----------|-------------|-------------------------------------------------|
//! | *(none)*  | CSV         | `event_log.csv`, `order_summary.csv`            |
//! | `sqlite`  | SQLite      | `output.db`                                     |
//! | `parquet` | Parquet     | `event_log.parquet`, `order_summary.parquet`    |
//!
//! All backends implement [`OutputWriter`].  They are driven either live by
//! [`LogOutputObserver`], which implements `hs_sim::SimObserver`, or after
//! the fact by [`export`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use hs_output::{CsvWriter, LogOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = LogOutputObserver::new(writer, config.start_unix_secs);
//! sim.run(&mut obs)?;
//! if let Some(e) = obs.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "parquet")]
pub mod parquet;

#[cfg(test)]
mod tests;

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::LogOutputObserver;
pub use row::{EventLogRow, OrderSummaryRow};
pub use writer::{export, OutputWriter};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;

#[cfg(feature = "parquet")]
pub use parquet::ParquetWriter;
