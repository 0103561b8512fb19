//! `hs-demand` — where orders come from.
//!
//! | Module        | Contents                                          |
//! |---------------|---------------------------------------------------|
//! | [`order`]     | `OrderSpec` (an order before it enters the world) |
//! | [`generator`] | `OrderGenerator` (Poisson arrivals, lazy)         |
//! | [`loader`]    | CSV scripted orders                               |
//! | [`error`]     | `DemandError`, `DemandResult<T>`                  |

pub mod error;
pub mod generator;
pub mod loader;
pub mod order;


pub use error::{DemandError, DemandResult};
pub use generator::OrderGenerator;
pub use loader::{load_orders_csv, load_orders_reader};
pub use order::OrderSpec;
