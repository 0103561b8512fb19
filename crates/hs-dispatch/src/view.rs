//! Read-only world state passed to every dispatcher call.

use hs_core::SimTime;
use hs_fleet::FleetStore;
use hs_network::{NetworkGraph, Router};

/// Everything a [`Dispatcher`](crate::Dispatcher) may look at.
///
/// Built by the engine for a single `DispatchCheck`; the engine never
/// mutates the fleet while a view is alive.
pub struct DispatchView<'a> {
    /// Current simulated instant.
    pub now:     SimTime,
    pub network: &'a NetworkGraph,
    pub fleet:   &'a FleetStore,
    pub router:  &'a dyn Router,
}

impl<'a> DispatchView<'a> {
    #[inline]
    pub fn new(
        now:     SimTime,
        network: &'a NetworkGraph,
        fleet:   &'a FleetStore,
        router:  &'a dyn Router,
    ) -> Self {
        Self { now, network, fleet, router }
    }
}
