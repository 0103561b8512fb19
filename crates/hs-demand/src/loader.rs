//! CSV scripted-order loader.
//!
//! # CSV format
//!
//! One row per order; the row position is the order's sequence among
//! scripted orders.  Times are seconds from run start.
//!
//! ```csv
//! origin,destination,created_secs,deadline_secs,size
//! 0,1,0,7200,4.0
//! 2,1,600,3600,1.5
//! ```
//!
//! Rows are not required to be sorted by `created_secs`; the engine's queue
//! orders them.  Node ranges are checked against the network when the
//! simulation is built (see [`OrderSpec::validate`]), not here.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use hs_core::{NodeId, SimTime};

use crate::{DemandError, DemandResult, OrderSpec};

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct OrderRecord {
    origin:        u32,
    destination:   u32,
    created_secs:  u64,
    deadline_secs: u64,
    size:          f64,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load scripted orders from a CSV file.
pub fn load_orders_csv(path: &Path) -> DemandResult<Vec<OrderSpec>> {
    let file = std::fs::File::open(path).map_err(DemandError::Io)?;
    load_orders_reader(file)
}

/// Like [`load_orders_csv`] but accepts any `Read` source.
///
/// Useful for testing (pass a `std::io::Cursor`) or embedding fixtures.
pub fn load_orders_reader<R: Read>(reader: R) -> DemandResult<Vec<OrderSpec>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    csv_reader
        .deserialize::<OrderRecord>()
        .enumerate()
        .map(|(row, result)| {
            let r = result.map_err(|e| DemandError::Parse(e.to_string()))?;
            if r.deadline_secs < r.created_secs {
                return Err(DemandError::Parse(format!(
                    "row {}: deadline_secs {} precedes created_secs {}",
                    row + 1,
                    r.deadline_secs,
                    r.created_secs
                )));
            }
            Ok(OrderSpec {
                origin:      NodeId(r.origin),
                destination: NodeId(r.destination),
                created:     SimTime(r.created_secs),
                deadline:    SimTime(r.deadline_secs),
                size:        r.size,
            })
        })
        .collect()
}
