//! Plain data row types written by output backends.

use hs_fleet::Order;
use hs_sim::LogRecord;

/// One processed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLogRow {
    pub seq:              u64,
    pub time_secs:        u64,
    pub unix_time_secs:   i64,
    pub event_type:       &'static str,
    /// `;`-joined, e.g. `order:4;truck:1`.
    pub subject_ids:      String,
    /// `;`-joined, aligned with `subject_ids`.
    pub resulting_states: String,
}

impl EventLogRow {
    pub fn from_record(record: &LogRecord, start_unix_secs: i64) -> Self {
        Self {
            seq:              record.seq,
            time_secs:        record.time.0,
            unix_time_secs:   start_unix_secs + record.time.0 as i64,
            event_type:       record.event_type(),
            subject_ids:      record.subject_ids(),
            resulting_states: record.resulting_states(),
        }
    }
}

/// Final state of one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummaryRow {
    pub order_id:       u32,
    pub origin:         u32,
    pub destination:    u32,
    pub created_secs:   u64,
    pub deadline_secs:  u64,
    /// `delivered`, `cancelled:no_route`, …
    pub status:         String,
    pub truck_id:       Option<u32>,
    pub delivered_secs: Option<u64>,
    pub lateness_secs:  u64,
}

impl From<&Order> for OrderSummaryRow {
    fn from(o: &Order) -> Self {
        Self {
            order_id:       o.id.0,
            origin:         o.origin.0,
            destination:    o.destination.0,
            created_secs:   o.created.0,
            deadline_secs:  o.deadline.0,
            status:         o.status.to_string(),
            truck_id:       o.truck.map(|t| t.0),
            delivered_secs: o.delivered_at.map(|t| t.0),
            lateness_secs:  o.lateness_secs(),
        }
    }
}
