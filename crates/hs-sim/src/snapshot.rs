//! Point-in-time views of the world.
//!
//! [`Snapshot::from_log`] rebuilds the world at any instant from the event
//! log and the initial fleet alone, so the same query always gives the same
//! answer.  [`Snapshot::live`] reads the engine's current state directly.
//! For the last processed instant the two agree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use hs_core::{GeoPoint, NodeId, NodeKind, OrderId, SimTime, TruckId};
use hs_fleet::{FleetStore, Location, OrderStatus, TruckAgent, TruckState};
use hs_network::NetworkGraph;
use hs_schedule::EventKind;

use crate::log::{Effect, LogRecord};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub id:        NodeId,
    pub kind:      NodeKind,
    pub pos:       GeoPoint,
    /// Service slots.
    pub capacity:  u32,
    /// Trucks being handled here.
    pub servicing: usize,
    /// Trucks waiting for a slot here.
    pub queued:    usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TruckView {
    pub id:         TruckId,
    pub state:      TruckState,
    pub location:   Location,
    /// Interpolated along the edge while moving.
    pub pos:        GeoPoint,
    pub drive_secs: u64,
    pub order:      Option<OrderId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderView {
    pub id:           OrderId,
    pub origin:       NodeId,
    pub destination:  NodeId,
    pub created:      SimTime,
    pub deadline:     SimTime,
    pub status:       OrderStatus,
    pub truck:        Option<TruckId>,
    pub delivered_at: Option<SimTime>,
}

impl OrderView {
    /// Seconds past the deadline at delivery; 0 if on time or undelivered.
    pub fn lateness_secs(&self) -> u64 {
        self.delivered_at.map_or(0, |t| t.since(self.deadline))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub time:   SimTime,
    pub nodes:  Vec<NodeView>,
    /// Indexed by `TruckId`.
    pub trucks: Vec<TruckView>,
    /// Ascending `OrderId`; only orders that have arrived by `time`.
    pub orders: Vec<OrderView>,
}

impl Snapshot {
    /// Fold `records` (all with `time <= t`) over the initial fleet.
    pub fn from_log(
        t:       SimTime,
        network: &NetworkGraph,
        initial: &[TruckAgent],
        records: &[LogRecord],
    ) -> Self {
        let mut trucks: Vec<(TruckState, Location, u64, Option<OrderId>)> = initial
            .iter()
            .map(|a| (a.state, a.location, a.drive_secs, a.order()))
            .collect();
        let mut orders: BTreeMap<OrderId, OrderView> = BTreeMap::new();

        for record in records {
            if let EventKind::OrderArrival { order, spec } = &record.event {
                orders.insert(*order, OrderView {
                    id:           *order,
                    origin:       spec.origin,
                    destination:  spec.destination,
                    created:      spec.created,
                    deadline:     spec.deadline,
                    status:       OrderStatus::Pending,
                    truck:        None,
                    delivered_at: None,
                });
            }
            for effect in &record.effects {
                match effect {
                    Effect::Truck { truck, state, location, drive_secs, order } => {
                        if let Some(slot) = trucks.get_mut(truck.index()) {
                            *slot = (*state, *location, *drive_secs, *order);
                        }
                    }
                    Effect::Order { order, status, truck } => {
                        if let Some(view) = orders.get_mut(order) {
                            view.status = *status;
                            view.truck = *truck;
                            if *status == OrderStatus::Delivered {
                                view.delivered_at = Some(record.time);
                            }
                        }
                    }
                }
            }
        }

        let trucks: Vec<TruckView> = trucks
            .into_iter()
            .enumerate()
            .map(|(i, (state, location, drive_secs, order))| TruckView {
                id: TruckId(i as u32),
                state,
                location,
                pos: position(network, &location, t),
                drive_secs,
                order,
            })
            .collect();

        Self { time: t, nodes: nodes(network, &trucks), trucks, orders: orders.into_values().collect() }
    }

    /// Read the engine's current state.
    pub fn live(t: SimTime, network: &NetworkGraph, fleet: &FleetStore) -> Self {
        let trucks: Vec<TruckView> = fleet
            .trucks()
            .iter()
            .map(|a| TruckView {
                id:         a.id,
                state:      a.state,
                location:   a.location,
                pos:        position(network, &a.location, t),
                drive_secs: a.drive_secs,
                order:      a.order(),
            })
            .collect();
        let orders = fleet
            .orders()
            .map(|o| OrderView {
                id:           o.id,
                origin:       o.origin,
                destination:  o.destination,
                created:      o.created,
                deadline:     o.deadline,
                status:       o.status,
                truck:        o.truck,
                delivered_at: o.delivered_at,
            })
            .collect();
        Self { time: t, nodes: nodes(network, &trucks), trucks, orders }
    }

    pub fn truck(&self, id: TruckId) -> Option<&TruckView> {
        self.trucks.get(id.index())
    }

    pub fn order(&self, id: OrderId) -> Option<&OrderView> {
        self.orders.binary_search_by_key(&id, |o| o.id).ok().map(|i| &self.orders[i])
    }

    pub fn trucks_in(&self, state: TruckState) -> usize {
        self.trucks.iter().filter(|t| t.state == state).count()
    }
}

/// Node views with service occupancy counted from the trucks parked there.
fn nodes(network: &NetworkGraph, trucks: &[TruckView]) -> Vec<NodeView> {
    let mut views: Vec<NodeView> = (0..network.node_count() as u32)
        .map(NodeId)
        .map(|id| NodeView {
            id,
            kind:      network.kind(id),
            pos:       network.pos(id),
            capacity:  network.capacity(id),
            servicing: 0,
            queued:    0,
        })
        .collect();
    for truck in trucks {
        let Some(view) = truck.location.node().and_then(|n| views.get_mut(n.index())) else {
            continue;
        };
        match truck.state {
            TruckState::Servicing => view.servicing += 1,
            TruckState::Queued    => view.queued += 1,
            _ => {}
        }
    }
    views
}

fn position(network: &NetworkGraph, location: &Location, t: SimTime) -> GeoPoint {
    match *location {
        Location::AtNode { node } => network.pos(node),
        Location::Roadside { edge, progress } => network.point_on_edge(edge, progress),
        Location::Moving { edge, .. } => {
            let progress = location.edge_progress_at(t).map_or(0.0, |(_, p)| p);
            network.point_on_edge(edge, progress)
        }
    }
}
