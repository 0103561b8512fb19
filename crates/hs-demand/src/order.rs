use serde::{Deserialize, Serialize};

use hs_core::{NodeId, SimTime};
use hs_network::NetworkGraph;

use crate::{DemandError, DemandResult};

/// An order as produced by a demand source, before the engine assigns it an
/// `OrderId` and a status.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderSpec {
    pub origin:      NodeId,
    pub destination: NodeId,
    pub created:     SimTime,
    pub deadline:    SimTime,
    /// Load units, same scale as truck capacity.
    pub size:        f64,
}

impl OrderSpec {
    /// Reject orders that could never be served on `network`.
    pub fn validate(&self, network: &NetworkGraph) -> DemandResult<()> {
        for n in [self.origin, self.destination] {
            if !network.contains_node(n) {
                return Err(DemandError::InvalidOrder(format!("node {n} is not in the network")));
            }
        }
        if self.origin == self.destination {
            return Err(DemandError::InvalidOrder(format!(
                "origin and destination are both {}",
                self.origin
            )));
        }
        if !(self.size.is_finite() && self.size > 0.0) {
            return Err(DemandError::InvalidOrder(format!("size must be positive, got {}", self.size)));
        }
        if self.deadline < self.created {
            return Err(DemandError::InvalidOrder(format!(
                "deadline {} precedes creation {}",
                self.deadline, self.created
            )));
        }
        Ok(())
    }
}
