//! `hs-fleet` — orders, trucks, and the store that holds them.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                         |
//! |--------------|------------------------------------------------------------------|
//! | [`order`]    | `Order`, `OrderStatus`, `CancelReason`                           |
//! | [`truck`]    | `TruckAgent` state machine, `TruckInput`, `Command`, `Location`  |
//! | [`facility`] | `Facilities` (per-node service slots, FIFO lines), `Admission`   |
//! | [`store`]    | `FleetStore` (trucks + order registry + pending index)           |
//! | [`builder`]  | `FleetBuilder`                                                   |
//! | [`error`]    | `FleetError`, `FleetResult<T>`                                   |

pub mod builder;
pub mod error;
pub mod facility;
pub mod order;
pub mod store;
pub mod truck;


pub use builder::FleetBuilder;
pub use error::{FleetError, FleetResult};
pub use facility::{Admission, Facilities};
pub use order::{CancelReason, Order, OrderStatus};
pub use store::FleetStore;
pub use truck::{Command, DriveLimits, Job, Leg, Location, TruckAgent, TruckInput, TruckState};
