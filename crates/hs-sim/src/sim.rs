//! The `Sim` struct and its event loop.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use tracing::{debug, info, warn};

use hs_core::{OrderId, SimConfig, SimRng, SimTime, TruckId};
use hs_delay::DelayModel;
use hs_demand::{OrderGenerator, OrderSpec};
use hs_dispatch::{DispatchDecision, DispatchView, Dispatcher};
use hs_fleet::{Admission, Command, Facilities, FleetStore, TruckAgent, TruckInput};
use hs_network::{NetworkGraph, Router};
use hs_schedule::{Event, EventKind, EventQueue};

use crate::{Effect, EventLog, LogRecord, SimError, SimObserver, SimResult, Snapshot};

// ── Run summary ───────────────────────────────────────────────────────────────

/// Totals reported when a run returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Events processed over the engine's lifetime.
    pub events:     u64,
    pub final_time: SimTime,
    pub delivered:  usize,
    pub cancelled:  usize,
    /// Orders still pending, assigned, or in transit.
    pub open:       usize,
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The discrete-event engine.
///
/// `Sim` is the only owner of mutable world state: the event queue, the
/// fleet (trucks and orders), facility slots, the RNG streams, and the log.  Each step pops
/// the earliest event, hands it to the handler for its kind, and appends the
/// resolved effects to the [`EventLog`].  Handlers never call each other;
/// every consequence that happens later, or later at the same instant, goes
/// back through the queue.
///
/// ```text
/// OrderArrival      → register order, DispatchCheck now + at deadline,
///                     schedule next generated order
/// DispatchCheck     → Dispatcher::decide, apply Assign / Cancel
/// ArrivalAtNode     → truck machine: next hop, rest, or delivery; or a
///                     service slot request (start now or join the line)
/// ServiceStart      → truck machine: handling begins, ServiceEnd later
/// ServiceEnd        → truck machine: carry on; slot passes to the next
///                     truck in line
/// RestStart/RestEnd → truck machine: rest bookkeeping
/// DeliveryComplete  → truck machine: hand over, go idle or rest
/// ```
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim {
    pub(crate) config:             SimConfig,
    pub(crate) network:            NetworkGraph,
    pub(crate) fleet:              FleetStore,
    pub(crate) facilities:         Facilities,
    /// Fleet as it was before the first event; base for `snapshot_at`.
    pub(crate) initial_trucks:     Vec<TruckAgent>,
    pub(crate) queue:              EventQueue,
    pub(crate) delay:              DelayModel,
    /// One travel-time stream per truck, indexed by `TruckId`.
    pub(crate) delay_rngs:         Vec<SimRng>,
    pub(crate) generator:          Option<OrderGenerator>,
    /// The queued generated order whose arrival pulls the next one.
    pub(crate) awaiting_generated: Option<OrderId>,
    pub(crate) next_order_id:      u32,
    pub(crate) dispatcher:         Box<dyn Dispatcher>,
    pub(crate) router:             Box<dyn Router>,
    pub(crate) log:                EventLog,
    /// Instants with a `DispatchCheck` already queued.
    pub(crate) dispatch_queued:    BTreeSet<SimTime>,
    pub(crate) now:                SimTime,
    pub(crate) processed:          u64,
}

impl fmt::Debug for Sim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sim")
            .field("now", &self.now)
            .field("processed", &self.processed)
            .field("queued", &self.queue.len())
            .field("dispatcher", &self.dispatcher.name())
            .finish_non_exhaustive()
    }
}

impl Sim {
    // ── Queries ───────────────────────────────────────────────────────────

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Timestamp of the last processed event.
    #[inline]
    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn network(&self) -> &NetworkGraph {
        &self.network
    }

    pub fn fleet(&self) -> &FleetStore {
        &self.fleet
    }

    pub fn facilities(&self) -> &Facilities {
        &self.facilities
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn events_processed(&self) -> u64 {
        self.processed
    }

    pub fn queued_events(&self) -> usize {
        self.queue.len()
    }

    /// The next `n` events in processing order, without removing them.
    pub fn upcoming(&self, n: usize) -> Vec<&Event> {
        self.queue.peek_n(n)
    }

    /// World state at `t`, rebuilt from the log and the initial fleet.
    ///
    /// Only meaningful for `t` up to [`now`](Self::now); later instants see
    /// the state as of `now`, with moving trucks interpolated toward their
    /// scheduled arrival.
    pub fn snapshot_at(&self, t: SimTime) -> Snapshot {
        Snapshot::from_log(t, &self.network, &self.initial_trucks, self.log.up_to(t))
    }

    /// Current world state, read from the live fleet.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::live(self.now, &self.network, &self.fleet)
    }

    pub fn summary(&self) -> RunSummary {
        let (delivered, cancelled, open) = self.fleet.order_tally();
        RunSummary { events: self.processed, final_time: self.now, delivered, cancelled, open }
    }

    // ── Running ───────────────────────────────────────────────────────────

    /// Run to the configured horizon.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<RunSummary> {
        let horizon = self.config.horizon();
        self.run_until(horizon, observer)
    }

    /// Process every event with timestamp `<= horizon`.  Events beyond it
    /// stay queued, so a later call can resume.
    pub fn run_until<O: SimObserver>(&mut self, horizon: SimTime, observer: &mut O) -> SimResult<RunSummary> {
        info!(
            horizon    = horizon.0,
            trucks     = self.fleet.truck_count(),
            queued     = self.queue.len(),
            dispatcher = self.dispatcher.name(),
            "run started"
        );

        while self.queue.next_time().is_some_and(|t| t <= horizon) {
            self.step(observer)?;
        }

        let summary = self.summary();
        info!(
            events     = summary.events,
            final_time = %summary.final_time,
            delivered  = summary.delivered,
            cancelled  = summary.cancelled,
            open       = summary.open,
            "run finished"
        );
        observer.on_run_end(self.now, &self.fleet);
        Ok(summary)
    }

    /// Process exactly one event.  Returns its timestamp, or `None` if the
    /// queue was empty.
    pub fn step<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<Option<SimTime>> {
        let Some(event) = self.queue.pop_earliest() else {
            return Ok(None);
        };
        if event.time < self.now {
            return Err(violation(self.now, format!("{} at t={} popped after t={}", event.kind.name(), event.time.0, self.now.0)));
        }
        self.now = event.time;
        debug!(seq = event.seq, time = event.time.0, kind = event.kind.name(), "event");

        let effects = self.handle(&event)?;
        self.processed += 1;

        match self.log.push(LogRecord::new(&event, effects)) {
            Ok(record) => observer.on_event(record),
            Err(record) => {
                return Err(violation(self.now, format!("log record seq {} breaks timestamp order", record.seq)));
            }
        }
        Ok(Some(event.time))
    }

    // ── Handlers ──────────────────────────────────────────────────────────

    fn handle(&mut self, event: &Event) -> SimResult<Vec<Effect>> {
        let now = event.time;
        let mut fx = Vec::new();
        match &event.kind {
            EventKind::OrderArrival { order, spec } => self.on_order_arrival(now, *order, spec, &mut fx)?,
            EventKind::DispatchCheck => self.on_dispatch_check(now, &mut fx)?,
            EventKind::ArrivalAtNode { truck, stop } => {
                self.drive(now, *truck, TruckInput::Arrived { stop: *stop }, &mut fx)?
            }
            EventKind::ServiceStart { truck, .. } => self.drive(now, *truck, TruckInput::ServiceStart, &mut fx)?,
            EventKind::ServiceEnd { truck, .. } => self.drive(now, *truck, TruckInput::ServiceEnd, &mut fx)?,
            EventKind::RestStart { truck } => self.drive(now, *truck, TruckInput::RestStart, &mut fx)?,
            EventKind::RestEnd { truck } => self.drive(now, *truck, TruckInput::RestEnd, &mut fx)?,
            EventKind::DeliveryComplete { truck, order } => {
                self.drive(now, *truck, TruckInput::Deliver { order: *order }, &mut fx)?
            }
        }
        Ok(fx)
    }

    fn on_order_arrival(&mut self, now: SimTime, id: OrderId, spec: &OrderSpec, fx: &mut Vec<Effect>) -> SimResult<()> {
        self.fleet.insert_order(id, spec).map_err(fatal(now))?;
        fx.push(self.order_effect(now, id)?);
        debug!(
            order       = %id,
            origin      = %spec.origin,
            destination = %spec.destination,
            deadline    = spec.deadline.0,
            "order arrived"
        );

        self.schedule_dispatch(now, now)?;
        if spec.deadline > now {
            self.schedule_dispatch(now, spec.deadline)?;
        }

        if self.awaiting_generated == Some(id) {
            self.awaiting_generated = None;
            if let Some(next) = self.generator.as_mut().and_then(Iterator::next) {
                let next_id = self.alloc_order_id();
                self.schedule(now, next.created, EventKind::OrderArrival { order: next_id, spec: next })?;
                self.awaiting_generated = Some(next_id);
            }
        }
        Ok(())
    }

    fn on_dispatch_check(&mut self, now: SimTime, fx: &mut Vec<Effect>) -> SimResult<()> {
        self.dispatch_queued.remove(&now);

        let decisions = {
            let view = DispatchView::new(now, &self.network, &self.fleet, self.router.as_ref());
            self.dispatcher.decide(&view)
        };

        for decision in decisions {
            match decision {
                DispatchDecision::Assign { order, truck, route, pickup, dropoff } => {
                    debug!(
                        order          = %order,
                        truck          = %truck,
                        hops           = route.edges.len(),
                        free_flow_secs = route.base_secs,
                        "order assigned"
                    );
                    self.fleet.assign_order(order, truck).map_err(fatal(now))?;
                    fx.push(self.order_effect(now, order)?);
                    let input = TruckInput::Assign { order, route: route.edges, pickup, dropoff };
                    self.drive(now, truck, input, fx)?;
                }
                DispatchDecision::Cancel { order, reason } => {
                    self.fleet.cancel_order(order, reason).map_err(fatal(now))?;
                    warn!(order = %order, reason = reason.as_str(), time = now.0, "order cancelled");
                    fx.push(self.order_effect(now, order)?);
                }
            }
        }
        Ok(())
    }

    /// Feed `input` to `truck` and carry out every command it emits.
    fn drive(&mut self, now: SimTime, truck: TruckId, input: TruckInput, fx: &mut Vec<Effect>) -> SimResult<()> {
        let limits = *self.fleet.limits();
        let agent = self.fleet.truck(truck).map_err(fatal(now))?.clone();
        let (mut agent, commands) = agent.step(now, input, &limits).map_err(fatal(now))?;

        let mut pending: VecDeque<Command> = commands.into();
        while let Some(command) = pending.pop_front() {
            match command {
                Command::SampleHop { edge } => {
                    let Some(rng) = self.delay_rngs.get_mut(truck.index()) else {
                        return Err(violation(now, format!("no delay stream for {truck}")));
                    };
                    let hop = self.delay.sample(&self.network, edge, now, rng);
                    let to = self.network.edge_target(edge);
                    debug!(%truck, ?edge, travel = hop.travel_secs, total = hop.total_secs(), "hop sampled");
                    let depart = TruckInput::Depart {
                        edge,
                        to,
                        secs:         hop.travel_secs,
                        service_secs: hop.service_secs,
                    };
                    let (next, more) = agent.step(now, depart, &limits).map_err(fatal(now))?;
                    agent = next;
                    pending.extend(more);
                }
                Command::ScheduleArrival { after, stop } => {
                    self.schedule(now, now.after(after), EventKind::ArrivalAtNode { truck, stop })?;
                }
                Command::RequestService { node } => {
                    match self.facilities.request(node, truck).map_err(fatal(now))? {
                        Admission::Start => self.schedule(now, now, EventKind::ServiceStart { truck, node })?,
                        Admission::Queued { position } => {
                            debug!(truck = %truck, node = %node, position, "waiting for service slot");
                        }
                    }
                }
                Command::ScheduleServiceEnd { after } => {
                    let Some(node) = agent.current_node() else {
                        return Err(violation(now, format!("{truck} in service away from a node")));
                    };
                    self.schedule(now, now.after(after), EventKind::ServiceEnd { truck, node })?;
                }
                Command::ReleaseService { node } => {
                    if let Some(next) = self.facilities.release(node).map_err(fatal(now))? {
                        self.schedule(now, now, EventKind::ServiceStart { truck: next, node })?;
                    }
                }
                Command::ScheduleRestStart => {
                    self.schedule(now, now, EventKind::RestStart { truck })?;
                }
                Command::ScheduleRestEnd { after } => {
                    self.schedule(now, now.after(after), EventKind::RestEnd { truck })?;
                }
                Command::ScheduleDelivery { order } => {
                    self.schedule(now, now, EventKind::DeliveryComplete { truck, order })?;
                }
                Command::PickedUp { order } => {
                    self.fleet.pick_up_order(order).map_err(fatal(now))?;
                    fx.push(self.order_effect(now, order)?);
                }
                Command::Delivered { order } => {
                    self.fleet.deliver_order(order, now).map_err(fatal(now))?;
                    let lateness = self.fleet.order(order).map_or(0, |o| o.lateness_secs());
                    debug!(order = %order, truck = %truck, lateness_secs = lateness, "order delivered");
                    fx.push(self.order_effect(now, order)?);
                }
                Command::BecameIdle => self.schedule_dispatch(now, now)?,
            }
        }

        if agent.drive_secs > limits.max_drive_secs {
            return Err(violation(
                now,
                format!("{truck} drove {}s without rest, limit {}s", agent.drive_secs, limits.max_drive_secs),
            ));
        }
        fx.push(truck_effect(&agent));
        self.fleet.put_truck(agent).map_err(fatal(now))
    }

    // ── Scheduling ────────────────────────────────────────────────────────

    /// Queue a follow-on of an event processed at `now`.  Only zero-duration
    /// kinds may share `now`; nothing may land before it.
    fn schedule(&mut self, now: SimTime, at: SimTime, kind: EventKind) -> SimResult<()> {
        if at < now || (at == now && !kind.is_instantaneous()) {
            return Err(violation(now, format!("{} scheduled for t={} while processing t={}", kind.name(), at.0, now.0)));
        }
        self.queue.push(at, kind);
        Ok(())
    }

    /// At most one queued `DispatchCheck` per instant.
    fn schedule_dispatch(&mut self, now: SimTime, at: SimTime) -> SimResult<()> {
        if self.dispatch_queued.insert(at) {
            self.schedule(now, at, EventKind::DispatchCheck)?;
        }
        Ok(())
    }

    /// Queue the first generated order.  Called once, before the first event.
    pub(crate) fn prime_generator(&mut self) {
        if let Some(spec) = self.generator.as_mut().and_then(Iterator::next) {
            let id = self.alloc_order_id();
            self.queue.push(spec.created, EventKind::OrderArrival { order: id, spec });
            self.awaiting_generated = Some(id);
        }
    }

    fn alloc_order_id(&mut self) -> OrderId {
        let id = OrderId(self.next_order_id);
        self.next_order_id += 1;
        id
    }

    fn order_effect(&self, now: SimTime, id: OrderId) -> SimResult<Effect> {
        let order = self.fleet.order(id).map_err(fatal(now))?;
        Ok(Effect::Order { order: id, status: order.status, truck: order.truck })
    }
}

fn truck_effect(agent: &TruckAgent) -> Effect {
    Effect::Truck {
        truck:      agent.id,
        state:      agent.state,
        location:   agent.location,
        drive_secs: agent.drive_secs,
        order:      agent.order(),
    }
}

fn violation(now: SimTime, detail: impl Into<String>) -> SimError {
    SimError::InvariantViolation { time: now.0, detail: detail.into() }
}

/// Any fleet-level rejection during a run is an invariant violation.
fn fatal<E: fmt::Display>(now: SimTime) -> impl FnOnce(E) -> SimError {
    move |e| violation(now, e.to_string())
}
