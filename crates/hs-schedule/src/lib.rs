//! `hs-schedule` — events and the queue that orders them.
//!
//! # Crate layout
//!
//! | Module    | Contents                              |
//! |-----------|---------------------------------------|
//! | [`event`] | `Event`, `EventKind`, `Stop`          |
//! | [`queue`] | `EventQueue` (binary heap)            |
//!
//! # Ordering
//!
//! Events are totally ordered by `(time, seq)`.  `seq` is assigned by the
//! queue on insertion and never reused, so two events at the same instant
//! pop in the order they were scheduled.  The engine relies on this for
//! same-instant follow-ons (a delivery at the moment of arrival, a dispatch
//! check right after a truck frees up).

pub mod event;
pub mod queue;


pub use event::{Event, EventKind, Stop};
pub use queue::EventQueue;
