//! `hs-core` — foundational types for the `haulsim` logistics simulator.
//!
//! This crate is a dependency of every other `hs-*` crate.  It has no `hs-*`
//! dependencies and few external ones (`rand`, `thiserror`, `serde`,
//! `serde_json`).
//!
//! # What lives here
//!
//! | Module       | Contents                                                    |
//! |--------------|-------------------------------------------------------------|
//! | [`ids`]      | `NodeId`, `EdgeId`, `TruckId`, `OrderId`                    |
//! | [`geo`]      | `GeoPoint`, haversine distance, interpolation               |
//! | [`time`]     | `SimTime` (integer seconds)                                 |
//! | [`kind`]     | `NodeKind` facility types                                   |
//! | [`rng`]      | `SimRng`, `RngStream` (per-component seeded streams)        |
//! | [`config`]   | `SimConfig` and its parameter sections                      |
//! | [`error`]    | `CoreError`, `CoreResult`                                   |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod kind;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{DelayParams, FleetParams, NetworkParams, OrderParams, SimConfig};
pub use error::{CoreError, CoreResult};
pub use geo::GeoPoint;
pub use ids::{EdgeId, NodeId, OrderId, TruckId};
pub use kind::NodeKind;
pub use rng::{RngStream, SimRng};
pub use time::SimTime;
