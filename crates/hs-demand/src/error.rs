use thiserror::Error;

use hs_core::NodeId;

#[derive(Debug, Error)]
pub enum DemandError {
    #[error("network has no supply nodes (warehouse, hub, or port) to originate orders")]
    NoSupplyNodes,

    #[error("network has no destination distinct from origin {0}")]
    NoDestination(NodeId),

    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("order file parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DemandResult<T> = Result<T, DemandError>;
