//! Customer orders and their lifecycle.
//!
//! ```text
//! Pending ──assign──▶ Assigned ──pick_up──▶ InTransit ──deliver──▶ Delivered
//!    │
//!    └──cancel──▶ Cancelled(reason)
//! ```
//!
//! Only `Pending` orders can be cancelled; once a truck commits to an order
//! it is carried through to delivery.

use std::fmt;

use serde::{Deserialize, Serialize};

use hs_core::{NodeId, OrderId, SimTime, TruckId};
use hs_demand::OrderSpec;

use crate::{FleetError, FleetResult};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// No truck could ever reach origin and destination.
    NoRoute,
    /// The deadline passed while the order was still pending.
    DeadlineMissed,
}

impl CancelReason {
    pub fn as_str(self) -> &'static str {
        match self {
            CancelReason::NoRoute        => "no_route",
            CancelReason::DeadlineMissed => "deadline_missed",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Assigned,
    InTransit,
    Delivered,
    Cancelled(CancelReason),
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending      => f.write_str("pending"),
            OrderStatus::Assigned     => f.write_str("assigned"),
            OrderStatus::InTransit    => f.write_str("in_transit"),
            OrderStatus::Delivered    => f.write_str("delivered"),
            OrderStatus::Cancelled(r) => write!(f, "cancelled:{}", r.as_str()),
        }
    }
}

/// An order inside the world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id:           OrderId,
    pub origin:       NodeId,
    pub destination:  NodeId,
    pub created:      SimTime,
    pub deadline:     SimTime,
    pub size:         f64,
    pub status:       OrderStatus,
    /// The truck carrying the order once assigned.
    pub truck:        Option<TruckId>,
    pub delivered_at: Option<SimTime>,
}

impl Order {
    pub fn new(id: OrderId, spec: &OrderSpec) -> Self {
        Self {
            id,
            origin:       spec.origin,
            destination:  spec.destination,
            created:      spec.created,
            deadline:     spec.deadline,
            size:         spec.size,
            status:       OrderStatus::Pending,
            truck:        None,
            delivered_at: None,
        }
    }

    /// Seconds past the deadline at delivery; 0 if on time or undelivered.
    pub fn lateness_secs(&self) -> u64 {
        self.delivered_at.map_or(0, |t| t.since(self.deadline))
    }

    pub(crate) fn assign(&mut self, truck: TruckId) -> FleetResult<()> {
        self.expect(OrderStatus::Pending, "assigned")?;
        self.status = OrderStatus::Assigned;
        self.truck = Some(truck);
        Ok(())
    }

    pub(crate) fn pick_up(&mut self) -> FleetResult<()> {
        self.expect(OrderStatus::Assigned, "in_transit")?;
        self.status = OrderStatus::InTransit;
        Ok(())
    }

    pub(crate) fn deliver(&mut self, at: SimTime) -> FleetResult<()> {
        self.expect(OrderStatus::InTransit, "delivered")?;
        self.status = OrderStatus::Delivered;
        self.delivered_at = Some(at);
        Ok(())
    }

    pub(crate) fn cancel(&mut self, reason: CancelReason) -> FleetResult<()> {
        self.expect(OrderStatus::Pending, reason.as_str())?;
        self.status = OrderStatus::Cancelled(reason);
        Ok(())
    }

    fn expect(&self, from: OrderStatus, to: &'static str) -> FleetResult<()> {
        if self.status != from {
            return Err(FleetError::IllegalOrderTransition { order: self.id, from: self.status, to });
        }
        Ok(())
    }
}
