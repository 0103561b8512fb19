use thiserror::Error;

use hs_core::{NodeId, OrderId, TruckId};

use crate::{OrderStatus, TruckState};

/// Errors produced by `hs-fleet`.
///
/// `Config` and `HomeOutOfRange` are build-time problems.  Every other
/// variant means the engine asked for something the state machines forbid
/// and is fatal to the run.
#[derive(Debug, Error, PartialEq)]
pub enum FleetError {
    #[error("fleet configuration error: {0}")]
    Config(String),

    #[error("home node {node} of {truck} is outside the network")]
    HomeOutOfRange { truck: TruckId, node: NodeId },

    #[error("{truck}: illegal input {input} while {state}")]
    IllegalTransition { truck: TruckId, state: TruckState, input: &'static str },

    #[error("{truck}: already carrying {current}, cannot take {order}")]
    DoubleAssignment { truck: TruckId, current: OrderId, order: OrderId },

    #[error("{truck}: continuous drive {drive_secs}s would exceed the {max_secs}s limit")]
    DriveLimitExceeded { truck: TruckId, drive_secs: u64, max_secs: u64 },

    #[error("{order}: illegal status change {from} -> {to}")]
    IllegalOrderTransition { order: OrderId, from: OrderStatus, to: &'static str },

    #[error("unknown {0}")]
    UnknownOrder(OrderId),

    #[error("unknown {0}")]
    UnknownTruck(TruckId),

    #[error("unknown facility {0}")]
    UnknownNode(NodeId),

    #[error("{0}: service slot released but none was held")]
    NoSlotHeld(NodeId),
}

pub type FleetResult<T> = Result<T, FleetError>;
