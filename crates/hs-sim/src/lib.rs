//! `hs-sim` — the discrete-event engine for haulsim.
//!
//! # Event loop
//!
//! ```text
//! loop:
//!   ① Pop      — earliest event by (time, seq); stop past the horizon.
//!   ② Handle   — one handler per event kind; effects applied to the fleet,
//!                follow-ons pushed to the queue (never into the past).
//!   ③ Log      — append {seq, time, event, effects} to the EventLog and
//!                notify the observer.
//! ```
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`sim`]       | `Sim` engine, `RunSummary`                                |
//! | [`builder`]   | `SimBuilder`                                              |
//! | [`log`]       | `EventLog`, `LogRecord`, `Effect`                         |
//! | [`snapshot`]  | `Snapshot` and its truck / order / node views             |
//! | [`observer`]  | `SimObserver` trait, `NoopObserver`, `CollectingObserver` |
//! | [`replicate`] | seeded replications (parallel with `parallel`)            |
//! | [`error`]     | `SimError`, `SimResult<T>`                                |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                               |
//! |------------|------------------------------------------------------|
//! | `parallel` | Runs replications on Rayon's thread pool.            |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use hs_core::SimConfig;
//! use hs_sim::{NoopObserver, SimBuilder};
//!
//! let config = SimConfig::from_json_path(path)?;
//! let mut sim = SimBuilder::new(config).build()?;
//! let summary = sim.run(&mut NoopObserver)?;
//! println!("{} delivered, {} cancelled", summary.delivered, summary.cancelled);
//! ```

pub mod builder;
pub mod error;
pub mod log;
pub mod observer;
pub mod replicate;
pub mod sim;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use log::{Effect, EventLog, LogRecord};
pub use observer::{CollectingObserver, NoopObserver, SimObserver};
pub use replicate::{run_replications, Replication};
pub use sim::{RunSummary, Sim};
pub use snapshot::{NodeView, OrderView, Snapshot, TruckView};
