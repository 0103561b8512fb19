use serde::{Deserialize, Serialize};

use hs_core::{EdgeId, NodeId, OrderId, SimTime, TruckId};
use hs_demand::OrderSpec;

/// Where an `ArrivalAtNode` leaves the truck.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stop {
    /// The target node of the hop.
    Node(NodeId),
    /// Part-way along `edge`, where the drive budget ran out.  `progress` is
    /// the fraction of the edge already covered, in `(0, 1)`.
    Roadside { edge: EdgeId, progress: f64 },
}

/// Event payloads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// A customer order enters the system.
    OrderArrival { order: OrderId, spec: OrderSpec },
    /// Match pending orders with idle trucks and expire overdue orders.
    DispatchCheck,
    /// A truck finishes a hop (or the drivable part of one).
    ArrivalAtNode { truck: TruckId, stop: Stop },
    /// A truck takes a free service slot at `node`.
    ServiceStart { truck: TruckId, node: NodeId },
    /// A truck's handling at `node` is done and its slot is released.
    ServiceEnd { truck: TruckId, node: NodeId },
    /// A truck must stop driving.
    RestStart { truck: TruckId },
    /// A truck's mandatory rest is over.
    RestEnd { truck: TruckId },
    /// A truck hands over its order at the destination.
    DeliveryComplete { truck: TruckId, order: OrderId },
}

impl EventKind {
    /// Stable name used as `event_type` in the event log.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::OrderArrival { .. }     => "order_arrival",
            EventKind::DispatchCheck           => "dispatch_check",
            EventKind::ArrivalAtNode { .. }    => "arrival_at_node",
            EventKind::ServiceStart { .. }     => "service_start",
            EventKind::ServiceEnd { .. }       => "service_end",
            EventKind::RestStart { .. }        => "rest_start",
            EventKind::RestEnd { .. }          => "rest_end",
            EventKind::DeliveryComplete { .. } => "delivery_complete",
        }
    }

    /// The truck this event is about, if any.
    pub fn truck(&self) -> Option<TruckId> {
        match self {
            EventKind::ArrivalAtNode { truck, .. }
            | EventKind::ServiceStart { truck, .. }
            | EventKind::ServiceEnd { truck, .. }
            | EventKind::RestStart { truck }
            | EventKind::RestEnd { truck }
            | EventKind::DeliveryComplete { truck, .. } => Some(*truck),
            EventKind::OrderArrival { .. } | EventKind::DispatchCheck => None,
        }
    }

    /// Events that may legitimately share their cause's timestamp.  Every
    /// other follow-on must be strictly later.
    pub fn is_instantaneous(&self) -> bool {
        matches!(
            self,
            EventKind::DispatchCheck
                | EventKind::ServiceStart { .. }
                | EventKind::RestStart { .. }
                | EventKind::DeliveryComplete { .. }
        )
    }
}

/// A scheduled event.  `seq` is assigned by [`EventQueue::push`].
///
/// [`EventQueue::push`]: crate::EventQueue::push
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub time: SimTime,
    pub seq:  u64,
    pub kind: EventKind,
}

impl Event {
    #[inline]
    pub fn key(&self) -> (SimTime, u64) {
        (self.time, self.seq)
    }
}
