//! Nearest-idle-truck policy.
//!
//! Pending orders are considered oldest first.  For each order:
//!
//! 1. If its deadline has been reached, cancel it (`DeadlineMissed`).
//! 2. If the destination cannot be reached from the origin, cancel it
//!    (`NoRoute`).
//! 3. Otherwise pick the idle truck with the smallest free-flow time to the
//!    origin, ties broken by truck id, skipping trucks that lack capacity,
//!    cannot reach the origin, or could not deliver before the deadline
//!    even at free-flow speed.
//!
//! Orders with no eligible truck stay pending for the next check.  There is
//! no batching: each order is matched greedily against the trucks left.
//!
//! Cost per call is one reverse Dijkstra and one forward Dijkstra per
//! pending order.

use rustc_hash::FxHashSet;
use tracing::trace;

use hs_core::TruckId;
use hs_fleet::CancelReason;
use hs_network::UNREACHABLE;

use crate::{DispatchDecision, DispatchView, Dispatcher};

#[derive(Clone, Copy, Debug, Default)]
pub struct NearestIdleDispatcher;

impl Dispatcher for NearestIdleDispatcher {
    fn name(&self) -> &'static str {
        "nearest_idle"
    }

    fn decide(&self, view: &DispatchView<'_>) -> Vec<DispatchDecision> {
        let mut decisions = Vec::new();
        let mut taken: FxHashSet<TruckId> = FxHashSet::default();

        for order in view.fleet.pending_orders() {
            if order.deadline <= view.now {
                decisions.push(DispatchDecision::Cancel {
                    order:  order.id,
                    reason: CancelReason::DeadlineMissed,
                });
                continue;
            }

            let Ok(delivery) = view.router.route(view.network, order.origin, order.destination) else {
                decisions.push(DispatchDecision::Cancel { order: order.id, reason: CancelReason::NoRoute });
                continue;
            };

            let to_origin = view.router.costs_to(view.network, order.origin);
            let slack = order.deadline.since(view.now);

            let best = view
                .fleet
                .idle_trucks()
                .filter(|t| !taken.contains(&t.id) && t.capacity >= order.size)
                .filter_map(|t| {
                    let node = t.current_node()?;
                    let cost = to_origin[node.index()];
                    if cost == UNREACHABLE || cost.saturating_add(delivery.base_secs) > slack {
                        trace!(truck = %t.id, order = %order.id, cost, "truck cannot serve order");
                        return None;
                    }
                    Some((cost, t.id, node))
                })
                .min_by_key(|(cost, id, _)| (*cost, *id));

            let Some((_, truck, node)) = best else { continue };
            let Ok(approach) = view.router.route(view.network, node, order.origin) else {
                continue;
            };
            taken.insert(truck);
            decisions.push(DispatchDecision::Assign {
                order:   order.id,
                truck,
                route:   approach.then(delivery),
                pickup:  order.origin,
                dropoff: order.destination,
            });
        }

        decisions
    }
}
