//! The ordered event log: the engine's contract with everything downstream.
//!
//! One [`LogRecord`] per processed event, appended in processing order.
//! Each record carries the event itself plus the resolved [`Effect`]s it had
//! on trucks and orders, so consumers never need to replay the engine to
//! know what happened.

use serde::{Deserialize, Serialize};

use hs_core::{OrderId, SimTime, TruckId};
use hs_fleet::{Location, OrderStatus, TruckState};
use hs_schedule::{Event, EventKind};

// ── Effects ───────────────────────────────────────────────────────────────────

/// The state a subject was left in by one event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subject", rename_all = "snake_case")]
pub enum Effect {
    Truck {
        truck:      TruckId,
        state:      TruckState,
        location:   Location,
        drive_secs: u64,
        order:      Option<OrderId>,
    },
    Order {
        order:  OrderId,
        status: OrderStatus,
        truck:  Option<TruckId>,
    },
}

impl Effect {
    /// `"truck:3"` / `"order:12"`.
    pub fn subject_id(&self) -> String {
        match self {
            Effect::Truck { truck, .. } => format!("truck:{}", truck.0),
            Effect::Order { order, .. } => format!("order:{}", order.0),
        }
    }

    /// Resulting state label, e.g. `"en_route"` or `"cancelled:no_route"`.
    pub fn state_label(&self) -> String {
        match self {
            Effect::Truck { state, .. }  => state.to_string(),
            Effect::Order { status, .. } => status.to_string(),
        }
    }
}

// ── LogRecord ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Queue sequence number of the event.
    pub seq:     u64,
    pub time:    SimTime,
    pub event:   EventKind,
    /// In the order they were applied.  A subject may appear more than once.
    pub effects: Vec<Effect>,
}

impl LogRecord {
    pub fn new(event: &Event, effects: Vec<Effect>) -> Self {
        Self { seq: event.seq, time: event.time, event: event.kind.clone(), effects }
    }

    #[inline]
    pub fn event_type(&self) -> &'static str {
        self.event.name()
    }

    /// `;`-joined subject ids, in effect order.
    pub fn subject_ids(&self) -> String {
        self.effects.iter().map(Effect::subject_id).collect::<Vec<_>>().join(";")
    }

    /// `;`-joined resulting states, aligned with [`subject_ids`](Self::subject_ids).
    pub fn resulting_states(&self) -> String {
        self.effects.iter().map(Effect::state_label).collect::<Vec<_>>().join(";")
    }
}

// ── EventLog ──────────────────────────────────────────────────────────────────

/// Append-only list of records with non-decreasing timestamps.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    records: Vec<LogRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `record`.  Returns it back if it would break timestamp order.
    pub(crate) fn push(&mut self, record: LogRecord) -> Result<&LogRecord, LogRecord> {
        if self.last_time().is_some_and(|t| record.time < t) {
            return Err(record);
        }
        self.records.push(record);
        Ok(&self.records[self.records.len() - 1])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogRecord> + '_ {
        self.records.iter()
    }

    pub fn last_time(&self) -> Option<SimTime> {
        self.records.last().map(|r| r.time)
    }

    /// Every record with `time <= t`.
    pub fn up_to(&self, t: SimTime) -> &[LogRecord] {
        let end = self.records.partition_point(|r| r.time <= t);
        &self.records[..end]
    }

    /// Records that touched `truck`, in log order.
    pub fn for_truck(&self, truck: TruckId) -> impl Iterator<Item = &LogRecord> + '_ {
        self.records.iter().filter(move |r| {
            r.event.truck() == Some(truck)
                || r.effects.iter().any(|e| matches!(e, Effect::Truck { truck: t, .. } if *t == truck))
        })
    }

    /// Records that touched `order`, in log order.
    pub fn for_order(&self, order: OrderId) -> impl Iterator<Item = &LogRecord> + '_ {
        self.records.iter().filter(move |r| {
            r.effects.iter().any(|e| matches!(e, Effect::Order { order: o, .. } if *o == order))
        })
    }
}
