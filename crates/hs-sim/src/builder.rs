//! Fluent builder for constructing a [`Sim`].

use std::collections::BTreeSet;

use tracing::{debug, warn};

use hs_core::{NodeId, NodeKind, OrderId, RngStream, SimConfig, SimRng, SimTime, TruckId};
use hs_delay::DelayModel;
use hs_demand::{OrderGenerator, OrderSpec};
use hs_dispatch::{Dispatcher, NearestIdleDispatcher};
use hs_fleet::{Facilities, FleetBuilder};
use hs_network::{generate_random, DijkstraRouter, NetworkGraph, Router};
use hs_schedule::{EventKind, EventQueue};

use crate::{EventLog, Sim, SimError, SimResult};

/// Fluent builder for [`Sim`].
///
/// # Required inputs
///
/// - [`SimConfig`]: seed, horizon, and every parameter section.
///
/// # Optional inputs (have defaults)
///
/// | Method                | Default                                          |
/// |-----------------------|--------------------------------------------------|
/// | `.network(g)`         | random k-NN graph from `config.network`          |
/// | `.orders(v)`          | no scripted orders                               |
/// | `.generate_orders(b)` | `true` (Poisson arrivals from `config.orders`)   |
/// | `.homes(v)`           | supply nodes (warehouse, hub, port), round-robin |
/// | `.dispatcher(d)`      | [`NearestIdleDispatcher`]                        |
/// | `.router(r)`          | [`DijkstraRouter`]                               |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(config)
///     .network(network)
///     .orders(load_orders_csv(path)?)
///     .generate_orders(false)
///     .build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder {
    config:     SimConfig,
    network:    Option<NetworkGraph>,
    orders:     Vec<OrderSpec>,
    generate:   bool,
    homes:      Option<Vec<NodeId>>,
    dispatcher: Box<dyn Dispatcher>,
    router:     Box<dyn Router>,
}

impl SimBuilder {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            network:    None,
            orders:     Vec::new(),
            generate:   true,
            homes:      None,
            dispatcher: Box::new(NearestIdleDispatcher),
            router:     Box::new(DijkstraRouter),
        }
    }

    /// Use this graph instead of generating one.
    pub fn network(mut self, network: NetworkGraph) -> Self {
        self.network = Some(network);
        self
    }

    /// Scripted orders, queued at build time.  They receive ids `0..n` in
    /// the given order; generated orders are numbered after them.
    pub fn orders(mut self, orders: Vec<OrderSpec>) -> Self {
        self.orders = orders;
        self
    }

    /// Turn the random order stream on or off.
    pub fn generate_orders(mut self, on: bool) -> Self {
        self.generate = on;
        self
    }

    /// Home nodes, assigned to trucks round-robin in id order.
    pub fn homes(mut self, homes: Vec<NodeId>) -> Self {
        self.homes = Some(homes);
        self
    }

    pub fn dispatcher<D: Dispatcher + 'static>(mut self, dispatcher: D) -> Self {
        self.dispatcher = Box::new(dispatcher);
        self
    }

    pub fn router<R: Router + 'static>(mut self, router: R) -> Self {
        self.router = Box::new(router);
        self
    }

    /// Validate everything, build the world, queue the initial orders, and
    /// return a ready-to-run [`Sim`].
    pub fn build(self) -> SimResult<Sim> {
        if let Err(e) = self.config.validate() {
            warn!(error = %e, "configuration rejected");
            return Err(SimError::Config(e.to_string()));
        }
        let seed = self.config.seed;

        // ── Network ───────────────────────────────────────────────────────
        let network = match self.network {
            Some(n) => n,
            None => generate_random(&self.config.network, &mut SimRng::stream(seed, RngStream::Network))?,
        };

        // ── Fleet ─────────────────────────────────────────────────────────
        let homes = match self.homes {
            Some(h) => h,
            None => supply_nodes(&network)?,
        };
        let fleet = FleetBuilder::new(&self.config.fleet)
            .homes(homes)
            .build(network.node_count())
            .map_err(|e| {
                warn!(error = %e, "fleet rejected");
                SimError::Config(e.to_string())
            })?;
        let delay_rngs = (0..fleet.truck_count())
            .map(|i| SimRng::truck_stream(seed, RngStream::Delay, TruckId(i as u32)))
            .collect();

        // ── Orders ────────────────────────────────────────────────────────
        let mut queue = EventQueue::new();
        for (i, spec) in self.orders.iter().enumerate() {
            spec.validate(&network)?;
            queue.push(spec.created, EventKind::OrderArrival { order: OrderId(i as u32), spec: spec.clone() });
        }
        let generator = if self.generate && self.config.orders.rate_per_hour > 0.0 {
            let rng = SimRng::stream(seed, RngStream::Orders);
            Some(OrderGenerator::new(&network, &self.config.orders, self.config.horizon(), rng)?)
        } else {
            None
        };

        debug!(
            nodes     = network.node_count(),
            edges     = network.edge_count(),
            trucks    = fleet.truck_count(),
            scripted  = self.orders.len(),
            generated = generator.is_some(),
            "simulation built"
        );

        let mut sim = Sim {
            delay:              DelayModel::new(&self.config.delay, self.config.start_unix_secs),
            initial_trucks:     fleet.trucks().to_vec(),
            facilities:         Facilities::new(network.node_capacity.clone()),
            next_order_id:      self.orders.len() as u32,
            config:             self.config,
            network,
            fleet,
            queue,
            delay_rngs,
            generator,
            awaiting_generated: None,
            dispatcher:         self.dispatcher,
            router:             self.router,
            log:                EventLog::new(),
            dispatch_queued:    BTreeSet::new(),
            now:                SimTime::ZERO,
            processed:          0,
        };
        sim.prime_generator();
        Ok(sim)
    }
}

/// Warehouses, hubs, and ports in ascending id order.
fn supply_nodes(network: &NetworkGraph) -> SimResult<Vec<NodeId>> {
    let mut nodes: Vec<NodeId> = NodeKind::ALL
        .iter()
        .filter(|k| k.is_supply())
        .flat_map(|k| network.nodes_of_kind(*k))
        .collect();
    nodes.sort_unstable();
    if nodes.is_empty() {
        return Err(SimError::Config("network has no warehouse, hub, or port to base trucks at".into()));
    }
    Ok(nodes)
}
