use hs_demand::DemandError;
use hs_network::NetworkError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// Rejected before the run starts.
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("order input error: {0}")]
    Demand(#[from] DemandError),

    /// A broken engine invariant.  The run halts and the world state is no
    /// longer trustworthy.
    #[error("invariant violation at t={time}s: {detail}")]
    InvariantViolation { time: u64, detail: String },
}

pub type SimResult<T> = Result<T, SimError>;
