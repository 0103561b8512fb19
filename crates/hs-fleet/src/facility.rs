//! Service slots and waiting lines at network nodes.
//!
//! Each node handles at most `capacity` trucks at once.  A truck that finds
//! every slot taken joins the node's FIFO line; releasing a slot hands it
//! straight to the head of that line, so `busy` only drops when nobody is
//! waiting.

use std::collections::VecDeque;

use hs_core::{NodeId, TruckId};

use crate::{FleetError, FleetResult};

/// Outcome of asking for a service slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Admission {
    /// A slot was free and is now held by the truck.
    Start,
    /// Every slot is taken; the truck is `position` places from the front.
    Queued { position: usize },
}

pub struct Facilities {
    capacity: Vec<u32>,
    busy:     Vec<u32>,
    queues:   Vec<VecDeque<TruckId>>,
}

impl Facilities {
    /// One entry per node, indexed by `NodeId`.
    pub fn new(capacity: Vec<u32>) -> Self {
        let n = capacity.len();
        Self { capacity, busy: vec![0; n], queues: vec![VecDeque::new(); n] }
    }

    pub fn request(&mut self, node: NodeId, truck: TruckId) -> FleetResult<Admission> {
        let i = self.slot(node)?;
        if self.busy[i] < self.capacity[i] {
            self.busy[i] += 1;
            return Ok(Admission::Start);
        }
        self.queues[i].push_back(truck);
        Ok(Admission::Queued { position: self.queues[i].len() - 1 })
    }

    /// Free one slot at `node`.  Returns the truck that now holds it, if
    /// anyone was waiting.
    pub fn release(&mut self, node: NodeId) -> FleetResult<Option<TruckId>> {
        let i = self.slot(node)?;
        if self.busy[i] == 0 {
            return Err(FleetError::NoSlotHeld(node));
        }
        match self.queues[i].pop_front() {
            Some(next) => Ok(Some(next)),
            None => {
                self.busy[i] -= 1;
                Ok(None)
            }
        }
    }

    #[inline]
    pub fn capacity(&self, node: NodeId) -> u32 {
        self.capacity.get(node.index()).copied().unwrap_or(0)
    }

    #[inline]
    pub fn busy(&self, node: NodeId) -> u32 {
        self.busy.get(node.index()).copied().unwrap_or(0)
    }

    /// Trucks waiting at `node`, front first.
    pub fn waiting(&self, node: NodeId) -> impl Iterator<Item = TruckId> + '_ {
        self.queues.get(node.index()).into_iter().flatten().copied()
    }

    fn slot(&self, node: NodeId) -> FleetResult<usize> {
        let i = node.index();
        if i < self.capacity.len() { Ok(i) } else { Err(FleetError::UnknownNode(node)) }
    }
}
