//! `hs-network` — facility network, spatial indexing, and routing.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                     |
//! |--------------|--------------------------------------------------------------|
//! | [`network`]  | `NetworkGraph` (CSR + reverse CSR + R-tree), `NetworkBuilder` |
//! | [`router`]   | `Router` trait, `Route`, `DijkstraRouter`                    |
//! | [`generate`] | random k-nearest-neighbour topologies                        |
//! | [`tsplib`]   | TSPLIB `NODE_COORD_SECTION` loading                          |
//! | [`error`]    | `NetworkError`, `NetworkResult<T>`                           |

pub mod error;
pub mod generate;
pub mod network;
pub mod router;
pub mod tsplib;


pub use error::{NetworkError, NetworkResult};
pub use generate::{assign_capacities, assign_kinds, build_knn, generate_random};
pub use network::{NetworkBuilder, NetworkGraph};
pub use router::{DijkstraRouter, Route, Router, UNREACHABLE};
pub use tsplib::{load_tsplib, network_from_tsplib, parse_tsplib, TspInstance, TspPoint};
