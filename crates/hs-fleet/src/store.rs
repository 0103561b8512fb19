//! `FleetStore` — every truck and every order that has entered the world.
//!
//! Trucks are indexed by `TruckId` in a `Vec`.  Orders live in a `BTreeMap`
//! because generated orders receive ids lazily and arrive interleaved with
//! scripted ones; ordered iteration keeps every scan deterministic.
//!
//! All order status changes go through the store so the pending index
//! (`(created, id)`, oldest first) can never drift from the statuses.

use std::collections::{BTreeMap, BTreeSet};

use hs_core::{OrderId, SimTime, TruckId};
use hs_demand::OrderSpec;

use crate::{CancelReason, DriveLimits, FleetError, FleetResult, Order, OrderStatus, TruckAgent};

pub struct FleetStore {
    trucks:  Vec<TruckAgent>,
    orders:  BTreeMap<OrderId, Order>,
    pending: BTreeSet<(SimTime, OrderId)>,
    limits:  DriveLimits,
}

impl FleetStore {
    pub(crate) fn new(trucks: Vec<TruckAgent>, limits: DriveLimits) -> Self {
        Self { trucks, orders: BTreeMap::new(), pending: BTreeSet::new(), limits }
    }

    #[inline]
    pub fn limits(&self) -> &DriveLimits {
        &self.limits
    }

    // ── Trucks ────────────────────────────────────────────────────────────

    pub fn truck_count(&self) -> usize {
        self.trucks.len()
    }

    pub fn trucks(&self) -> &[TruckAgent] {
        &self.trucks
    }

    pub fn truck(&self, id: TruckId) -> FleetResult<&TruckAgent> {
        self.trucks.get(id.index()).ok_or(FleetError::UnknownTruck(id))
    }

    /// Replace a truck with its successor state.
    pub fn put_truck(&mut self, agent: TruckAgent) -> FleetResult<()> {
        let slot = self
            .trucks
            .get_mut(agent.id.index())
            .ok_or(FleetError::UnknownTruck(agent.id))?;
        *slot = agent;
        Ok(())
    }

    /// Idle trucks in ascending id order.
    pub fn idle_trucks(&self) -> impl Iterator<Item = &TruckAgent> + '_ {
        self.trucks.iter().filter(|t| t.is_idle())
    }

    // ── Orders ────────────────────────────────────────────────────────────

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn orders(&self) -> impl Iterator<Item = &Order> + '_ {
        self.orders.values()
    }

    pub fn order(&self, id: OrderId) -> FleetResult<&Order> {
        self.orders.get(&id).ok_or(FleetError::UnknownOrder(id))
    }

    /// Pending orders, oldest first (creation time, then id).
    pub fn pending_orders(&self) -> impl Iterator<Item = &Order> + '_ {
        self.pending.iter().filter_map(|(_, id)| self.orders.get(id))
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Register an arriving order as `Pending`.
    pub fn insert_order(&mut self, id: OrderId, spec: &OrderSpec) -> FleetResult<&Order> {
        if self.orders.contains_key(&id) {
            return Err(FleetError::Config(format!("{id} registered twice")));
        }
        self.pending.insert((spec.created, id));
        Ok(self.orders.entry(id).or_insert_with(|| Order::new(id, spec)))
    }

    pub fn assign_order(&mut self, id: OrderId, truck: TruckId) -> FleetResult<()> {
        let order = self.orders.get_mut(&id).ok_or(FleetError::UnknownOrder(id))?;
        order.assign(truck)?;
        self.pending.remove(&(order.created, id));
        Ok(())
    }

    pub fn pick_up_order(&mut self, id: OrderId) -> FleetResult<()> {
        self.orders.get_mut(&id).ok_or(FleetError::UnknownOrder(id))?.pick_up()
    }

    pub fn deliver_order(&mut self, id: OrderId, at: SimTime) -> FleetResult<()> {
        self.orders.get_mut(&id).ok_or(FleetError::UnknownOrder(id))?.deliver(at)
    }

    pub fn cancel_order(&mut self, id: OrderId, reason: CancelReason) -> FleetResult<()> {
        let order = self.orders.get_mut(&id).ok_or(FleetError::UnknownOrder(id))?;
        order.cancel(reason)?;
        self.pending.remove(&(order.created, id));
        Ok(())
    }

    /// `(delivered, cancelled, open)` order counts.
    pub fn order_tally(&self) -> (usize, usize, usize) {
        self.orders.values().fold((0, 0, 0), |(d, c, o), order| match order.status {
            OrderStatus::Delivered    => (d + 1, c, o),
            OrderStatus::Cancelled(_) => (d, c + 1, o),
            _                         => (d, c, o + 1),
        })
    }
}
