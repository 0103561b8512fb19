//! `hs-dispatch` — deciding which truck serves which order.
//!
//! | Module         | Contents                                             |
//! |----------------|------------------------------------------------------|
//! | [`view`]       | `DispatchView` (read-only world state)               |
//! | [`dispatcher`] | `Dispatcher` trait, `DispatchDecision`               |
//! | [`nearest`]    | `NearestIdleDispatcher` (default policy)             |
//!
//! Dispatchers never mutate anything.  They return decisions; the engine
//! applies them through the fleet store and the truck state machine, which
//! reject anything illegal.

pub mod dispatcher;
pub mod nearest;
pub mod view;


pub use dispatcher::{DispatchDecision, Dispatcher};
pub use nearest::NearestIdleDispatcher;
pub use view::DispatchView;
