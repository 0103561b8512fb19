//! Network-subsystem error type.

use thiserror::Error;

use hs_core::NodeId;

/// Errors produced by `hs-network`.
///
/// Everything except [`NetworkError::NoRoute`] is a build-time configuration
/// problem and should stop a run before it starts.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("network has no nodes")]
    Empty,

    #[error("node {0} not found in network")]
    NodeNotFound(NodeId),

    #[error("duplicate edge {from} -> {to}")]
    DuplicateEdge { from: NodeId, to: NodeId },

    #[error("self-loop edge at {0}")]
    SelfLoop(NodeId),

    #[error("edge {from} -> {to} has zero base travel time")]
    ZeroTravelTime { from: NodeId, to: NodeId },

    #[error("node {0} has zero service capacity")]
    ZeroCapacity(NodeId),

    #[error("no route from {from} to {to}")]
    NoRoute { from: NodeId, to: NodeId },

    #[error("TSPLIB parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type NetworkResult<T> = Result<T, NetworkError>;
