//! Core error type.
//!
//! Sub-crates define their own error enums and either convert `CoreError`
//! via `From` or wrap it as one variant; both patterns are acceptable.

use thiserror::Error;

/// The top-level error type for `hs-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("config JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `hs-core`.
pub type CoreResult<T> = Result<T, CoreError>;
