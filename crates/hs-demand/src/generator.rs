//! Stochastic order arrivals.
//!
//! Inter-arrival gaps are exponential with mean `3600 / rate_per_hour`
//! seconds, rounded and floored at one second so consecutive orders never
//! share a creation instant.  Per order the stream draws, in order: gap,
//! origin, destination, size, deadline slack.

use hs_core::time::SECS_PER_HOUR;
use hs_core::{NodeId, NodeKind, OrderParams, SimRng, SimTime};
use hs_network::NetworkGraph;

use crate::{DemandError, DemandResult, OrderSpec};

/// Lazy iterator over generated orders.
///
/// Ends when the next creation time would pass the horizon, when the order
/// cap is reached, or immediately if the rate is zero.  [`restart`]
/// rewinds to the first order; the replayed sequence is identical.
///
/// [`restart`]: OrderGenerator::restart
#[derive(Clone, Debug)]
pub struct OrderGenerator {
    origins:      Vec<NodeId>,
    customers:    Vec<NodeId>,
    all_nodes:    Vec<NodeId>,
    params:       OrderParams,
    horizon:      SimTime,
    initial_rng:  SimRng,
    rng:          SimRng,
    clock:        SimTime,
    emitted:      usize,
    exhausted:    bool,
}

impl OrderGenerator {
    /// Origins are supply nodes (warehouse, hub, port); destinations are
    /// customers, or any other node when the network has no customers.
    pub fn new(
        network: &NetworkGraph,
        params: &OrderParams,
        horizon: SimTime,
        rng: SimRng,
    ) -> DemandResult<Self> {
        let mut origins: Vec<NodeId> = NodeKind::ALL
            .iter()
            .filter(|k| k.is_supply())
            .flat_map(|k| network.nodes_of_kind(*k))
            .collect();
        origins.sort_unstable();
        if origins.is_empty() {
            return Err(DemandError::NoSupplyNodes);
        }
        if network.node_count() < 2 {
            return Err(DemandError::NoDestination(origins[0]));
        }

        Ok(Self {
            origins,
            customers: network.nodes_of_kind(NodeKind::Customer),
            all_nodes: (0..network.node_count() as u32).map(NodeId).collect(),
            params: params.clone(),
            horizon,
            initial_rng: rng.clone(),
            rng,
            clock: SimTime::ZERO,
            emitted: 0,
            exhausted: false,
        })
    }

    /// Rewind to the first order.
    pub fn restart(&mut self) {
        self.rng = self.initial_rng.clone();
        self.clock = SimTime::ZERO;
        self.emitted = 0;
        self.exhausted = false;
    }

    /// Orders produced since construction or the last restart.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn horizon(&self) -> SimTime {
        self.horizon
    }

    fn next_gap(&mut self) -> Option<u64> {
        let rate_per_sec = self.params.rate_per_hour / SECS_PER_HOUR as f64;
        let gap = self.rng.exponential(rate_per_sec);
        if !gap.is_finite() {
            return None;
        }
        Some((gap.round() as u64).max(1))
    }

    fn pick_destination(&mut self, origin: NodeId) -> NodeId {
        let pool = if self.customers.is_empty() { &self.all_nodes } else { &self.customers };
        let candidates: Vec<NodeId> = pool.iter().copied().filter(|n| *n != origin).collect();
        // `new` guarantees at least two nodes, and customers are never supply.
        self.rng.choose(&candidates).copied().unwrap_or(origin)
    }
}

impl Iterator for OrderGenerator {
    type Item = OrderSpec;

    fn next(&mut self) -> Option<OrderSpec> {
        if self.exhausted {
            return None;
        }
        if self.params.max_orders.is_some_and(|cap| self.emitted >= cap) {
            self.exhausted = true;
            return None;
        }
        let Some(gap) = self.next_gap() else {
            self.exhausted = true;
            return None;
        };
        let created = self.clock.after(gap);
        if created > self.horizon {
            self.exhausted = true;
            return None;
        }

        let origin = self.rng.choose(&self.origins).copied().unwrap_or(self.origins[0]);
        let destination = self.pick_destination(origin);

        let (lo, hi) = self.params.size_range;
        let size = if hi > lo { self.rng.gen_range(lo..=hi) } else { lo };
        let (slack_lo, slack_hi) = self.params.deadline_slack_secs;
        let slack = self.rng.gen_range(slack_lo..=slack_hi);

        self.clock = created;
        self.emitted += 1;
        Some(OrderSpec {
            origin,
            destination,
            created,
            deadline: created.after(slack),
            size,
        })
    }
}
