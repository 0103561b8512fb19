//! `hs-delay` — how long a hop actually takes.
//!
//! | Module      | Contents                                   |
//! |-------------|--------------------------------------------|
//! | [`traffic`] | `TrafficProfile` (hour-of-day multipliers) |
//! | [`model`]   | `DelayModel`, `HopTiming`                  |
//!
//! The model is a pure function of `(edge, now, rng)` that returns travel
//! and facility service time separately.  It reads the immutable network and
//! its own parameters and advances only the RNG it is handed.  Given the same stream position it always returns the same value.

pub mod model;
pub mod traffic;

#[cfg(test)]
mod tests;

pub use model::{DelayModel, HopTiming};
pub use traffic::TrafficProfile;
