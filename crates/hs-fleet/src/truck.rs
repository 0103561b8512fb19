//! Per-truck state machine.
//!
//! # States
//!
//! ```text
//!            Assign                      Deliver (budget left)
//!   Idle ───────────────▶ EnRoute ───────────────────────────▶ Idle
//!    ▲                     │   ▲
//!    │ RestEnd (no job)    │   │ RestEnd (job in progress)
//!    │                     ▼   │
//!    └──────────────── Resting ◀── RestStart (budget exhausted)
//! ```
//!
//! # Facility service
//!
//! Every hop carries the handling time sampled for its target.  When a
//! truck reaches a node with handling owed it asks the engine for a slot
//! ([`Command::RequestService`]) and waits in `Queued` until the facility
//! admits it.  Handling never counts as driving.
//!
//! ```text
//!   EnRoute ──Arrived (node)──▶ Queued ──ServiceStart──▶ Servicing
//!      ▲                                                     │
//!      └──────────────────────── ServiceEnd ─────────────────┘
//! ```
//!
//! # Purity
//!
//! [`TruckAgent::step`] consumes the agent and an input and returns the next
//! agent plus a list of [`Command`]s.  It never touches the queue, the RNG,
//! or the network; the engine turns commands into events.  A hop's duration
//! is supplied from outside: the machine asks for it with
//! [`Command::SampleHop`] and the engine answers with
//! [`TruckInput::Depart`] inside the same event.
//!
//! # Drive budget
//!
//! `drive_secs` counts driving since the last rest.  A hop that would push it
//! past the limit is split: the truck drives until the budget is spent, stops
//! at the roadside, rests, and then drives the remaining seconds of the same
//! hop.  The hop is sampled once; the remainder is never re-drawn.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use hs_core::{EdgeId, FleetParams, NodeId, OrderId, SimTime, TruckId};
use hs_schedule::Stop;

use crate::{FleetError, FleetResult};

// ── State & location ──────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruckState {
    Idle,
    EnRoute,
    /// At a node, waiting for a service slot.
    Queued,
    /// Being handled at a node.
    Servicing,
    Resting,
}

impl fmt::Display for TruckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TruckState::Idle      => "idle",
            TruckState::EnRoute   => "en_route",
            TruckState::Queued    => "queued",
            TruckState::Servicing => "servicing",
            TruckState::Resting   => "resting",
        })
    }
}

/// Where a truck is.  Progress values are fractions of the edge in `[0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "at", rename_all = "snake_case")]
pub enum Location {
    AtNode { node: NodeId },
    /// Driving `edge` from `from_progress` at `depart` to `to_progress` at
    /// `arrive`.
    Moving {
        edge:          EdgeId,
        from_progress: f64,
        to_progress:   f64,
        depart:        SimTime,
        arrive:        SimTime,
    },
    /// Stopped part-way along `edge`.
    Roadside { edge: EdgeId, progress: f64 },
}

impl Location {
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Location::AtNode { node } => Some(*node),
            _ => None,
        }
    }

    /// `(edge, progress)` at instant `t`, linearly interpolated while
    /// moving.  `None` when parked at a node.
    pub fn edge_progress_at(&self, t: SimTime) -> Option<(EdgeId, f64)> {
        match *self {
            Location::AtNode { .. } => None,
            Location::Roadside { edge, progress } => Some((edge, progress)),
            Location::Moving { edge, from_progress, to_progress, depart, arrive } => {
                let span = arrive.since(depart);
                if span == 0 {
                    return Some((edge, to_progress));
                }
                let frac = (t.since(depart) as f64 / span as f64).clamp(0.0, 1.0);
                Some((edge, from_progress + (to_progress - from_progress) * frac))
            }
        }
    }
}

// ── Limits ────────────────────────────────────────────────────────────────────

/// Hours-of-service rules shared by the whole fleet.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DriveLimits {
    pub max_drive_secs: u64,
    pub rest_secs:      u64,
}

impl From<&FleetParams> for DriveLimits {
    fn from(p: &FleetParams) -> Self {
        Self { max_drive_secs: p.max_drive_secs, rest_secs: p.rest_secs }
    }
}

// ── Job & leg ─────────────────────────────────────────────────────────────────

/// The order a truck is working on and the hops still ahead of it.
#[derive(Clone, Debug, PartialEq)]
pub struct Job {
    pub order:     OrderId,
    pub pickup:    NodeId,
    pub dropoff:   NodeId,
    pub picked_up: bool,
    /// Hops not yet started, in order.
    pub route:     VecDeque<EdgeId>,
}

/// The hop currently being driven.
#[derive(Clone, Debug, PartialEq)]
pub struct Leg {
    pub edge:         EdgeId,
    pub to:           NodeId,
    /// Sampled driving time of the whole hop.
    pub total_secs:   u64,
    /// Seconds of the hop covered once the current stint ends.
    pub covered_secs: u64,
    /// Handling owed at `to` once the hop is driven.
    pub service_secs: u64,
}

impl Leg {
    #[inline]
    pub fn progress(&self) -> f64 {
        self.covered_secs as f64 / self.total_secs as f64
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.covered_secs >= self.total_secs
    }
}

// ── Inputs & commands ─────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum TruckInput {
    /// Take `order`: drive `route` (current node → `pickup` → `dropoff`).
    Assign { order: OrderId, route: Vec<EdgeId>, pickup: NodeId, dropoff: NodeId },
    /// Start the next hop: drive for `secs`, then be handled at `to` for
    /// `service_secs`.
    Depart { edge: EdgeId, to: NodeId, secs: u64, service_secs: u64 },
    Arrived { stop: Stop },
    /// A service slot at the current node is free for this truck.
    ServiceStart,
    ServiceEnd,
    RestStart,
    RestEnd,
    Deliver { order: OrderId },
}

impl TruckInput {
    pub fn name(&self) -> &'static str {
        match self {
            TruckInput::Assign { .. }  => "assign",
            TruckInput::Depart { .. }  => "depart",
            TruckInput::Arrived { .. } => "arrived",
            TruckInput::ServiceStart   => "service_start",
            TruckInput::ServiceEnd     => "service_end",
            TruckInput::RestStart      => "rest_start",
            TruckInput::RestEnd        => "rest_end",
            TruckInput::Deliver { .. } => "deliver",
        }
    }
}

/// What the engine must do after a transition.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Sample the duration of `edge` now and feed it back as `Depart`.
    SampleHop { edge: EdgeId },
    ScheduleArrival { after: u64, stop: Stop },
    /// Queue for a service slot at `node`.
    RequestService { node: NodeId },
    ScheduleServiceEnd { after: u64 },
    /// Handling at `node` is over; hand the slot on.
    ReleaseService { node: NodeId },
    /// Rest starts at the current instant.
    ScheduleRestStart,
    ScheduleRestEnd { after: u64 },
    /// Hand-over happens at the current instant.
    ScheduleDelivery { order: OrderId },
    PickedUp { order: OrderId },
    Delivered { order: OrderId },
    /// The truck can take new work.
    BecameIdle,
}

// ── TruckAgent ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct TruckAgent {
    pub id:           TruckId,
    pub home:         NodeId,
    pub capacity:     f64,
    pub state:        TruckState,
    pub location:     Location,
    /// Continuous driving since the last rest.
    pub drive_secs:   u64,
    /// Handling owed at the current node while `Queued` or `Servicing`.
    pub service_secs: u64,
    pub job:          Option<Job>,
    pub leg:          Option<Leg>,
}

impl TruckAgent {
    /// A fresh, idle truck parked at `home`.
    pub fn new(id: TruckId, home: NodeId, capacity: f64) -> Self {
        Self {
            id,
            home,
            capacity,
            state:        TruckState::Idle,
            location:     Location::AtNode { node: home },
            drive_secs:   0,
            service_secs: 0,
            job:          None,
            leg:          None,
        }
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.state == TruckState::Idle
    }

    #[inline]
    pub fn order(&self) -> Option<OrderId> {
        self.job.as_ref().map(|j| j.order)
    }

    #[inline]
    pub fn current_node(&self) -> Option<NodeId> {
        self.location.node()
    }

    pub fn remaining_drive_secs(&self, limits: &DriveLimits) -> u64 {
        limits.max_drive_secs.saturating_sub(self.drive_secs)
    }

    /// Apply one input.  On error the agent is dropped; the engine treats
    /// every transition error as fatal.
    pub fn step(
        mut self,
        now: SimTime,
        input: TruckInput,
        limits: &DriveLimits,
    ) -> FleetResult<(TruckAgent, Vec<Command>)> {
        let mut out = Vec::new();
        let name = input.name();

        match (self.state, input) {
            (TruckState::Idle, TruckInput::Assign { order, route, pickup, dropoff }) => {
                if let Some(job) = &self.job {
                    return Err(FleetError::DoubleAssignment { truck: self.id, current: job.order, order });
                }
                let Some(here) = self.current_node() else {
                    return Err(self.illegal(name));
                };
                if route.is_empty() || pickup == dropoff {
                    return Err(self.illegal(name));
                }
                let picked_up = here == pickup;
                if picked_up {
                    out.push(Command::PickedUp { order });
                }
                self.job = Some(Job { order, pickup, dropoff, picked_up, route: route.into() });
                self.state = TruckState::EnRoute;
                self.continue_route(&mut out, limits);
            }

            (TruckState::EnRoute, TruckInput::Depart { edge, to, secs, service_secs }) => {
                let next = self.job.as_ref().and_then(|j| j.route.front().copied());
                if self.leg.is_some() || next != Some(edge) || secs == 0 || self.current_node().is_none() {
                    return Err(self.illegal(name));
                }
                if let Some(job) = self.job.as_mut() {
                    job.route.pop_front();
                }
                self.leg = Some(Leg { edge, to, total_secs: secs, covered_secs: 0, service_secs });
                self.drive_stint(now, &mut out, limits)?;
            }

            (TruckState::EnRoute, TruckInput::Arrived { stop }) => {
                let Some(leg) = self.leg.clone() else {
                    return Err(self.illegal(name));
                };
                match stop {
                    Stop::Node(n) => {
                        if n != leg.to || !leg.is_complete() {
                            return Err(self.illegal(name));
                        }
                        self.leg = None;
                        self.location = Location::AtNode { node: n };
                        if leg.service_secs > 0 {
                            self.state = TruckState::Queued;
                            self.service_secs = leg.service_secs;
                            out.push(Command::RequestService { node: n });
                        } else {
                            self.leave_node(n, &mut out, limits);
                        }
                    }
                    Stop::Roadside { edge, progress } => {
                        if edge != leg.edge || leg.is_complete() {
                            return Err(self.illegal(name));
                        }
                        self.location = Location::Roadside { edge, progress };
                        out.push(Command::ScheduleRestStart);
                    }
                }
            }

            (TruckState::Queued, TruckInput::ServiceStart) => {
                if self.service_secs == 0 {
                    return Err(self.illegal(name));
                }
                self.state = TruckState::Servicing;
                out.push(Command::ScheduleServiceEnd { after: self.service_secs });
            }

            (TruckState::Servicing, TruckInput::ServiceEnd) => {
                let Some(n) = self.current_node() else {
                    return Err(self.illegal(name));
                };
                self.service_secs = 0;
                self.state = TruckState::EnRoute;
                out.push(Command::ReleaseService { node: n });
                self.leave_node(n, &mut out, limits);
            }

            (TruckState::EnRoute, TruckInput::RestStart) => {
                self.state = TruckState::Resting;
                out.push(Command::ScheduleRestEnd { after: limits.rest_secs });
            }

            (TruckState::Resting, TruckInput::RestEnd) => {
                self.drive_secs = 0;
                if self.job.is_none() {
                    self.state = TruckState::Idle;
                    out.push(Command::BecameIdle);
                } else {
                    self.state = TruckState::EnRoute;
                    if self.leg.is_some() {
                        self.drive_stint(now, &mut out, limits)?;
                    } else {
                        self.continue_route(&mut out, limits);
                    }
                }
            }

            (TruckState::EnRoute, TruckInput::Deliver { order }) => {
                let deliverable = self.leg.is_none()
                    && self.job.as_ref().is_some_and(|j| {
                        j.order == order
                            && j.picked_up
                            && j.route.is_empty()
                            && self.location.node() == Some(j.dropoff)
                    });
                if !deliverable {
                    return Err(self.illegal(name));
                }
                self.job = None;
                out.push(Command::Delivered { order });
                if self.drive_secs < limits.max_drive_secs {
                    self.state = TruckState::Idle;
                    out.push(Command::BecameIdle);
                } else {
                    out.push(Command::ScheduleRestStart);
                }
            }

            (_, _) => return Err(self.illegal(name)),
        }

        Ok((self, out))
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn illegal(&self, input: &'static str) -> FleetError {
        FleetError::IllegalTransition { truck: self.id, state: self.state, input }
    }

    /// Done at node `n`: mark the pickup, then carry on along the route.
    fn leave_node(&mut self, n: NodeId, out: &mut Vec<Command>, limits: &DriveLimits) {
        if let Some(job) = self.job.as_mut() {
            if !job.picked_up && n == job.pickup {
                job.picked_up = true;
                out.push(Command::PickedUp { order: job.order });
            }
        }
        self.continue_route(out, limits);
    }

    /// At a node with a job: deliver, rest, or ask for the next hop.
    fn continue_route(&self, out: &mut Vec<Command>, limits: &DriveLimits) {
        let Some(job) = &self.job else { return };
        match job.route.front() {
            None => out.push(Command::ScheduleDelivery { order: job.order }),
            Some(_) if self.drive_secs >= limits.max_drive_secs => out.push(Command::ScheduleRestStart),
            Some(edge) => out.push(Command::SampleHop { edge: *edge }),
        }
    }

    /// Drive as much of the current leg as the budget allows.  Only travel
    /// seconds are charged to `drive_secs`.
    fn drive_stint(&mut self, now: SimTime, out: &mut Vec<Command>, limits: &DriveLimits) -> FleetResult<()> {
        let budget = self.remaining_drive_secs(limits);
        let Some(leg) = self.leg.as_mut() else { return Ok(()) };

        let left = leg.total_secs - leg.covered_secs;
        let stint = left.min(budget);
        if stint == 0 {
            return Err(FleetError::DriveLimitExceeded {
                truck:      self.id,
                drive_secs: self.drive_secs + left,
                max_secs:   limits.max_drive_secs,
            });
        }

        let from_progress = leg.progress();
        leg.covered_secs += stint;
        let to_progress = leg.progress();
        let stop = if leg.is_complete() {
            Stop::Node(leg.to)
        } else {
            Stop::Roadside { edge: leg.edge, progress: to_progress }
        };

        self.location = Location::Moving {
            edge: leg.edge,
            from_progress,
            to_progress,
            depart: now,
            arrive: now.after(stint),
        };
        self.drive_secs += stint;
        out.push(Command::ScheduleArrival { after: stint, stop });
        Ok(())
    }
}
