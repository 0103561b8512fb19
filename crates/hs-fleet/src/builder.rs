//! Fluent builder for the initial fleet.
//!
//! # Usage
//!
//! ```rust
//! use hs_core::{FleetParams, NodeId};
//! use hs_fleet::FleetBuilder;
//!
//! let params = FleetParams { size: 3, ..FleetParams::default() };
//! let fleet = FleetBuilder::new(&params)
//!     .homes(vec![NodeId(0), NodeId(4)])  // cycled: 0, 4, 0
//!     .build(10)
//!     .unwrap();
//!
//! assert_eq!(fleet.truck_count(), 3);
//! assert_eq!(fleet.trucks()[2].home, NodeId(0));
//! ```

use hs_core::{FleetParams, NodeId, TruckId};

use crate::{DriveLimits, FleetError, FleetResult, FleetStore, TruckAgent};

pub struct FleetBuilder {
    size:     usize,
    capacity: f64,
    limits:   DriveLimits,
    homes:    Vec<NodeId>,
}

impl FleetBuilder {
    pub fn new(params: &FleetParams) -> Self {
        Self {
            size:     params.size,
            capacity: params.capacity,
            limits:   DriveLimits::from(params),
            homes:    vec![NodeId(0)],
        }
    }

    /// Home nodes, assigned to trucks round-robin in id order.
    pub fn homes(mut self, homes: Vec<NodeId>) -> Self {
        self.homes = homes;
        self
    }

    /// Consume the builder.  `node_count` bounds the valid home ids.
    pub fn build(self, node_count: usize) -> FleetResult<FleetStore> {
        if self.size == 0 {
            return Err(FleetError::Config("fleet must contain at least one truck".into()));
        }
        if self.homes.is_empty() {
            return Err(FleetError::Config("no home nodes given".into()));
        }
        if self.limits.rest_secs == 0 || self.limits.max_drive_secs == 0 {
            return Err(FleetError::Config("drive limit and rest duration must be positive".into()));
        }

        let trucks = (0..self.size)
            .map(|i| {
                let id = TruckId(i as u32);
                let home = self.homes[i % self.homes.len()];
                if home.index() >= node_count {
                    return Err(FleetError::HomeOutOfRange { truck: id, node: home });
                }
                Ok(TruckAgent::new(id, home, self.capacity))
            })
            .collect::<FleetResult<Vec<_>>>()?;

        Ok(FleetStore::new(trucks, self.limits))
    }
}
