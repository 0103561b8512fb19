//! The `Dispatcher` trait — the assignment-policy extension point.

use hs_core::{NodeId, OrderId, TruckId};
use hs_fleet::CancelReason;
use hs_network::Route;

use crate::DispatchView;

/// One outcome of a dispatch pass.
#[derive(Clone, Debug, PartialEq)]
pub enum DispatchDecision {
    /// `truck` takes `order` and drives `route` (truck node → `pickup` →
    /// `dropoff`).
    Assign {
        order:   OrderId,
        truck:   TruckId,
        route:   Route,
        pickup:  NodeId,
        dropoff: NodeId,
    },
    /// `order` can no longer be served.
    Cancel { order: OrderId, reason: CancelReason },
}

/// Pluggable assignment policy.
///
/// # Contract
///
/// - Each truck appears in at most one `Assign` per call, and only idle
///   trucks may be assigned.
/// - Each order appears in at most one decision per call, and only pending
///   orders may be named.
/// - Decisions are applied in the order returned.
///
/// The engine enforces the first two points and halts the run if a policy
/// breaks them.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync` so independent replications can
/// share one dispatcher across Rayon worker threads.
pub trait Dispatcher: Send + Sync {
    /// Short policy name for logs.
    fn name(&self) -> &'static str;

    /// Decide assignments and cancellations for the current instant.
    fn decide(&self, view: &DispatchView<'_>) -> Vec<DispatchDecision>;
}
