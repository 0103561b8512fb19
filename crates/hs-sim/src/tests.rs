//! Integration tests for hs-sim.

use hs_core::{
    DelayParams, FleetParams, GeoPoint, NodeId, NodeKind, OrderParams, SimConfig, SimTime,
};
use hs_demand::OrderSpec;
use hs_network::{NetworkBuilder, NetworkGraph};
use hs_schedule::{EventKind, Stop};

use crate::{LogRecord, Sim, SimBuilder};

// ── Helpers ───────────────────────────────────────────────────────────────────

const W: NodeId = NodeId(0);
const C: NodeId = NodeId(1);
/// Customer with no roads.
const X: NodeId = NodeId(2);

/// W ↔ C, 60 minutes each way, plus isolated X.
fn corridor() -> NetworkGraph {
    let mut b = NetworkBuilder::new();
    b.add_node(GeoPoint::new(50.0, 19.0), NodeKind::Warehouse);
    b.add_node(GeoPoint::new(50.0, 20.0), NodeKind::Customer);
    b.add_node(GeoPoint::new(40.0, 10.0), NodeKind::Customer);
    b.add_link(W, C, 71_500.0, 3_600);
    b.build().unwrap()
}

fn config(trucks: usize, max_drive_secs: u64) -> SimConfig {
    SimConfig {
        seed:         1,
        horizon_secs: 86_400,
        fleet:        FleetParams { size: trucks, capacity: 10.0, max_drive_secs, rest_secs: 3_600 },
        orders:       OrderParams { rate_per_hour: 0.0, ..OrderParams::default() },
        delay:        DelayParams::zero_variance(),
        ..SimConfig::default()
    }
}

fn order(dest: NodeId, created: u64, deadline: u64) -> OrderSpec {
    OrderSpec {
        origin:      W,
        destination: dest,
        created:     SimTime(created),
        deadline:    SimTime(deadline),
        size:        1.0,
    }
}

fn corridor_sim(max_drive_secs: u64, orders: Vec<OrderSpec>) -> Sim {
    SimBuilder::new(config(1, max_drive_secs))
        .network(corridor())
        .homes(vec![W])
        .orders(orders)
        .generate_orders(false)
        .build()
        .unwrap()
}

/// A random-world config small enough to run many times.
fn random_config(seed: u64) -> SimConfig {
    SimConfig {
        seed,
        horizon_secs: 2 * 86_400,
        network: hs_core::NetworkParams {
            node_count: 15,
            lat_range: (50.0, 52.0),
            lon_range: (18.0, 21.0),
            ..Default::default()
        },
        fleet: FleetParams { size: 3, capacity: 8.0, max_drive_secs: 2 * 3_600, rest_secs: 1_800 },
        orders: OrderParams { rate_per_hour: 3.0, ..OrderParams::default() },
        ..SimConfig::default()
    }
}

fn times_of(records: &[LogRecord], f: impl Fn(&EventKind) -> bool) -> Vec<u64> {
    records.iter().filter(|r| f(&r.event)).map(|r| r.time.0).collect()
}

// ── Reference scenarios ───────────────────────────────────────────────────────

#[cfg(test)]
mod scenarios {
    use hs_core::{OrderId, TruckId};
    use hs_fleet::{CancelReason, Location, OrderStatus, TruckState};

    use super::*;
    use crate::NoopObserver;

    #[test]
    fn single_trip_within_budget() {
        let mut sim = corridor_sim(8 * 3_600, vec![order(C, 0, 86_400)]);
        sim.run(&mut NoopObserver).unwrap();
        let log = sim.log().records();

        let arrivals = times_of(log, |e| matches!(e, EventKind::ArrivalAtNode { stop: Stop::Node(n), .. } if *n == C));
        assert_eq!(arrivals, vec![3_600]);
        assert_eq!(times_of(log, |e| matches!(e, EventKind::DeliveryComplete { .. })), vec![3_600]);
        assert!(times_of(log, |e| matches!(e, EventKind::RestStart { .. })).is_empty());

        let truck = sim.fleet().truck(TruckId(0)).unwrap();
        assert_eq!(truck.state, TruckState::Idle);
        assert_eq!(truck.location, Location::AtNode { node: C });

        let o = sim.fleet().order(OrderId(0)).unwrap();
        assert_eq!(o.status, OrderStatus::Delivered);
        assert_eq!(o.delivered_at, Some(SimTime(3_600)));

        let at_delivery = sim.snapshot_at(SimTime(3_600));
        assert_eq!(at_delivery.truck(TruckId(0)).unwrap().state, TruckState::Idle);
    }

    #[test]
    fn forced_rest_delays_arrival_by_rest_duration() {
        let mut sim = corridor_sim(1_800, vec![order(C, 0, 86_400)]);
        sim.run(&mut NoopObserver).unwrap();
        let log = sim.log().records();

        let roadside: Vec<_> = log
            .iter()
            .filter_map(|r| match r.event {
                EventKind::ArrivalAtNode { stop: Stop::Roadside { progress, .. }, .. } => Some((r.time.0, progress)),
                _ => None,
            })
            .collect();
        assert_eq!(roadside, vec![(1_800, 0.5)]);

        let rest_starts = times_of(log, |e| matches!(e, EventKind::RestStart { .. }));
        assert_eq!(rest_starts[0], 1_800);
        assert_eq!(times_of(log, |e| matches!(e, EventKind::RestEnd { .. }))[0], 5_400);

        let arrivals = times_of(log, |e| matches!(e, EventKind::ArrivalAtNode { stop: Stop::Node(n), .. } if *n == C));
        assert_eq!(arrivals, vec![3_600 + 3_600]);
        assert_eq!(sim.fleet().order(OrderId(0)).unwrap().delivered_at, Some(SimTime(7_200)));

        // Budget is spent again on delivery: one more rest, then idle.
        assert_eq!(rest_starts, vec![1_800, 7_200]);
        assert_eq!(times_of(log, |e| matches!(e, EventKind::RestEnd { .. })), vec![5_400, 10_800]);
        assert_eq!(sim.fleet().truck(TruckId(0)).unwrap().state, TruckState::Idle);
    }

    #[test]
    fn unreachable_deadline_cancels_at_deadline() {
        let mut sim = corridor_sim(8 * 3_600, vec![order(C, 0, 10)]);
        sim.run(&mut NoopObserver).unwrap();

        let o = sim.fleet().order(OrderId(0)).unwrap();
        assert_eq!(o.status, OrderStatus::Cancelled(CancelReason::DeadlineMissed));
        assert_eq!(o.delivered_at, None);

        let log = sim.log();
        let cancel = log.for_order(OrderId(0)).last().unwrap();
        assert_eq!(cancel.time, SimTime(10));
        assert!(matches!(cancel.event, EventKind::DispatchCheck));
        assert!(times_of(log.records(), |e| matches!(e, EventKind::ArrivalAtNode { .. })).is_empty());
    }

    #[test]
    fn unroutable_order_cancelled_on_arrival() {
        let mut sim = corridor_sim(8 * 3_600, vec![order(X, 100, 86_400)]);
        sim.run(&mut NoopObserver).unwrap();

        let o = sim.fleet().order(OrderId(0)).unwrap();
        assert_eq!(o.status, OrderStatus::Cancelled(CancelReason::NoRoute));
        assert_eq!(sim.log().for_order(OrderId(0)).last().unwrap().time, SimTime(100));
    }

    #[test]
    fn second_order_waits_for_the_truck() {
        let mut sim = corridor_sim(8 * 3_600, vec![order(C, 0, 86_400), order(C, 60, 86_400)]);
        sim.run(&mut NoopObserver).unwrap();

        // Second order: truck returns C → W (3600 s) then W → C (3600 s).
        let second = sim.fleet().order(OrderId(1)).unwrap();
        assert_eq!(second.status, OrderStatus::Delivered);
        assert_eq!(second.delivered_at, Some(SimTime(3 * 3_600)));
        assert_eq!(sim.summary().delivered, 2);
    }
}

// ── Facility service ──────────────────────────────────────────────────────────

#[cfg(test)]
mod service {
    use hs_core::{OrderId, TruckId};
    use hs_fleet::TruckState;

    use super::*;
    use crate::{Effect, NoopObserver};

    const I: NodeId = NodeId(1);
    const DEST: NodeId = NodeId(2);

    /// W —(3600 s)→ I (inspection) —(600 s)→ DEST.
    fn via_inspection() -> NetworkGraph {
        let mut b = NetworkBuilder::new();
        b.add_node(GeoPoint::new(50.0, 19.0), NodeKind::Warehouse);
        b.add_node(GeoPoint::new(50.0, 20.0), NodeKind::Inspection);
        b.add_node(GeoPoint::new(50.0, 20.2), NodeKind::Customer);
        b.add_link(W, I, 71_500.0, 3_600);
        b.add_link(I, DEST, 14_000.0, 600);
        b.build().unwrap()
    }

    fn max_drive(records: &[LogRecord]) -> Option<u64> {
        records
            .iter()
            .flat_map(|r| r.effects.iter())
            .filter_map(|e| match e {
                Effect::Truck { drive_secs, .. } => Some(*drive_secs),
                Effect::Order { .. } => None,
            })
            .max()
    }

    #[test]
    fn inspection_handling_does_not_use_drive_budget() {
        let mut cfg = config(1, 4_200);
        cfg.delay.inspection_service_secs = 1_200;
        let mut sim = SimBuilder::new(cfg)
            .network(via_inspection())
            .homes(vec![W])
            .orders(vec![OrderSpec { destination: DEST, ..order(C, 0, 86_400) }])
            .generate_orders(false)
            .build()
            .unwrap();
        sim.run(&mut NoopObserver).unwrap();
        let log = sim.log().records();

        // The whole 3600 s hop fits in the 4200 s budget: no roadside stop.
        assert!(log.iter().all(|r| !matches!(r.event, EventKind::ArrivalAtNode { stop: Stop::Roadside { .. }, .. })));
        let at_i = times_of(log, |e| matches!(e, EventKind::ArrivalAtNode { stop: Stop::Node(n), .. } if *n == I));
        assert_eq!(at_i, vec![3_600]);
        assert_eq!(times_of(log, |e| matches!(e, EventKind::ServiceStart { node, .. } if *node == I)), vec![3_600]);
        assert_eq!(times_of(log, |e| matches!(e, EventKind::ServiceEnd { node, .. } if *node == I)), vec![4_800]);

        let after_service = log
            .iter()
            .find(|r| matches!(r.event, EventKind::ServiceEnd { .. }))
            .and_then(|r| r.effects.iter().find_map(|e| match e {
                Effect::Truck { drive_secs, .. } => Some(*drive_secs),
                Effect::Order { .. } => None,
            }));
        assert_eq!(after_service, Some(3_600));

        // The remaining 600 s of budget cover the last hop exactly.
        assert_eq!(sim.fleet().order(OrderId(0)).unwrap().delivered_at, Some(SimTime(5_400)));
        assert_eq!(max_drive(log), Some(4_200));
        assert_eq!(times_of(log, |e| matches!(e, EventKind::RestStart { .. })), vec![5_400]);
    }

    #[test]
    fn full_facility_serves_trucks_in_arrival_order() {
        let mut cfg = config(2, 8 * 3_600);
        cfg.delay.service_shape = 1;
        cfg.delay.service_scale_secs = 300.0;
        cfg.delay.service_clamp_secs = (600, 600);
        let mut sim = SimBuilder::new(cfg)
            .network(corridor())
            .homes(vec![W])
            .orders(vec![order(C, 0, 86_400), order(C, 0, 86_400)])
            .generate_orders(false)
            .build()
            .unwrap();
        assert_eq!(sim.network().capacity(C), 1);
        sim.run(&mut NoopObserver).unwrap();
        let log = sim.log().records();

        let trucks_where = |f: &dyn Fn(&EventKind) -> bool| -> Vec<TruckId> {
            log.iter().filter(|r| f(&r.event)).filter_map(|r| r.event.truck()).collect()
        };
        let arrived = trucks_where(&|e| matches!(e, EventKind::ArrivalAtNode { stop: Stop::Node(n), .. } if *n == C));
        let served = trucks_where(&|e| matches!(e, EventKind::ServiceStart { node, .. } if *node == C));
        assert_eq!(arrived.len(), 2);
        assert_eq!(served, arrived);

        assert_eq!(times_of(log, |e| matches!(e, EventKind::ServiceStart { .. })), vec![3_600, 4_200]);
        let mut delivered: Vec<u64> = sim
            .fleet()
            .orders()
            .filter_map(|o| o.delivered_at.map(|t| t.0))
            .collect();
        delivered.sort_unstable();
        assert_eq!(delivered, vec![4_200, 4_800]);

        let snap = sim.snapshot_at(SimTime(3_600));
        let c = &snap.nodes[C.index()];
        assert_eq!((c.capacity, c.servicing, c.queued), (1, 1, 1));
        assert_eq!(snap.trucks_in(TruckState::Queued), 1);
        assert_eq!(sim.facilities().busy(C), 0);
    }
}

// ── Log properties ────────────────────────────────────────────────────────────

#[cfg(test)]
mod log_tests {
    use hs_core::OrderId;

    use super::*;
    use crate::{CollectingObserver, Effect, NoopObserver};

    #[test]
    fn records_carry_effects_in_order() {
        let mut sim = corridor_sim(8 * 3_600, vec![order(C, 0, 86_400)]);
        sim.run(&mut NoopObserver).unwrap();

        let first_dispatch = sim
            .log()
            .iter()
            .find(|r| matches!(r.event, EventKind::DispatchCheck))
            .unwrap();
        assert_eq!(first_dispatch.subject_ids(), "order:0;order:0;truck:0");
        assert_eq!(first_dispatch.resulting_states(), "assigned;in_transit;en_route");
        assert_eq!(first_dispatch.event_type(), "dispatch_check");
    }

    #[test]
    fn causal_chain_for_delivered_order() {
        let mut sim = corridor_sim(8 * 3_600, vec![order(C, 0, 86_400)]);
        sim.run(&mut NoopObserver).unwrap();

        let kinds: Vec<&str> = sim.log().for_order(OrderId(0)).map(|r| r.event_type()).collect();
        assert_eq!(kinds, vec!["order_arrival", "dispatch_check", "delivery_complete"]);
        assert!(sim.log().iter().any(|r| matches!(r.event, EventKind::ArrivalAtNode { .. })));
    }

    #[test]
    fn seq_strictly_increases_within_an_instant() {
        let mut sim = corridor_sim(8 * 3_600, vec![order(C, 0, 86_400)]);
        sim.run(&mut NoopObserver).unwrap();
        for pair in sim.log().records().windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(a.time <= b.time);
            if a.time == b.time {
                assert!(a.seq < b.seq, "{a:?} then {b:?}");
            }
        }
    }

    #[test]
    fn observer_sees_every_record() {
        let mut sim = corridor_sim(8 * 3_600, vec![order(C, 0, 86_400)]);
        let mut obs = CollectingObserver::default();
        sim.run(&mut obs).unwrap();
        assert_eq!(obs.records.as_slice(), sim.log().records());
        assert_eq!(obs.ended, Some(sim.now()));
    }

    #[test]
    fn drive_time_logged_with_truck_effects() {
        let mut sim = corridor_sim(1_800, vec![order(C, 0, 86_400)]);
        sim.run(&mut NoopObserver).unwrap();
        let max = sim
            .log()
            .iter()
            .flat_map(|r| r.effects.iter())
            .filter_map(|e| match e {
                Effect::Truck { drive_secs, .. } => Some(*drive_secs),
                Effect::Order { .. } => None,
            })
            .max();
        assert_eq!(max, Some(1_800));
    }
}

// ── Engine control ────────────────────────────────────────────────────────────

#[cfg(test)]
mod engine {
    use super::*;
    use crate::NoopObserver;

    #[test]
    fn step_processes_one_event() {
        let mut sim = corridor_sim(8 * 3_600, vec![order(C, 0, 86_400)]);
        assert_eq!(sim.step(&mut NoopObserver).unwrap(), Some(SimTime::ZERO));
        assert_eq!(sim.log().len(), 1);
        assert_eq!(sim.events_processed(), 1);
        assert!(matches!(sim.log().records()[0].event, EventKind::OrderArrival { .. }));
    }

    #[test]
    fn step_on_empty_queue_is_none() {
        let mut sim = corridor_sim(8 * 3_600, vec![]);
        assert_eq!(sim.step(&mut NoopObserver).unwrap(), None);
        assert!(sim.log().is_empty());
    }

    #[test]
    fn upcoming_lists_queued_events_in_order() {
        let sim = corridor_sim(8 * 3_600, vec![order(C, 500, 86_400), order(C, 100, 86_400)]);
        let times: Vec<u64> = sim.upcoming(5).iter().map(|e| e.time.0).collect();
        assert_eq!(times, vec![100, 500]);
        assert_eq!(sim.queued_events(), 2);
    }

    #[test]
    fn horizon_leaves_later_events_queued() {
        let mut sim = corridor_sim(8 * 3_600, vec![order(C, 0, 86_400)]);
        let summary = sim.run_until(SimTime(1_000), &mut NoopObserver).unwrap();
        assert_eq!(summary.final_time, SimTime::ZERO);
        assert_eq!(summary.open, 1);
        assert_eq!(sim.upcoming(1)[0].time, SimTime(3_600));
    }

    #[test]
    fn resumed_run_matches_single_run() {
        let mut whole = SimBuilder::new(random_config(9)).build().unwrap();
        whole.run(&mut NoopObserver).unwrap();

        let mut split = SimBuilder::new(random_config(9)).build().unwrap();
        split.run_until(SimTime(40_000), &mut NoopObserver).unwrap();
        split.run(&mut NoopObserver).unwrap();

        assert_eq!(whole.log(), split.log());
    }

    #[test]
    fn generated_orders_numbered_after_scripted() {
        let mut cfg = random_config(3);
        cfg.orders.max_orders = Some(5);
        let net = hs_network::generate_random(&cfg.network, &mut hs_core::SimRng::new(1)).unwrap();
        let origin = net.nodes_of_kind(NodeKind::Warehouse)[0];
        let dest = net.nodes_of_kind(NodeKind::Customer)[0];
        let scripted = OrderSpec { origin, destination: dest, created: SimTime(10), deadline: SimTime(90_000), size: 1.0 };

        let mut sim = SimBuilder::new(cfg).network(net).orders(vec![scripted]).build().unwrap();
        sim.run(&mut NoopObserver).unwrap();

        let ids: Vec<u32> = sim
            .log()
            .iter()
            .filter_map(|r| match &r.event {
                EventKind::OrderArrival { order, .. } => Some(order.0),
                _ => None,
            })
            .collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(sim.fleet().order_count(), 6);
    }
}

// ── Builder validation ────────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;
    use crate::SimError;

    #[test]
    fn zero_rest_is_config_error() {
        let mut cfg = config(1, 3_600);
        cfg.fleet.rest_secs = 0;
        let err = SimBuilder::new(cfg).network(corridor()).build().unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }

    #[test]
    fn home_out_of_range_is_config_error() {
        let err = SimBuilder::new(config(1, 3_600))
            .network(corridor())
            .homes(vec![NodeId(99)])
            .build()
            .unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }

    #[test]
    fn invalid_scripted_order_rejected() {
        let err = SimBuilder::new(config(1, 3_600))
            .network(corridor())
            .orders(vec![order(NodeId(42), 0, 100)])
            .generate_orders(false)
            .build()
            .unwrap_err();
        assert!(matches!(err, SimError::Demand(_)));
    }

    #[test]
    fn default_homes_are_supply_nodes() {
        let sim = SimBuilder::new(config(3, 3_600)).network(corridor()).build().unwrap();
        assert!(sim.fleet().trucks().iter().all(|t| t.home == W));
    }

    #[test]
    fn generated_network_when_none_given() {
        let sim = SimBuilder::new(random_config(1)).build().unwrap();
        assert_eq!(sim.network().node_count(), 15);
        assert_eq!(sim.fleet().truck_count(), 3);
    }
}

// ── Invariant enforcement ─────────────────────────────────────────────────────

#[cfg(test)]
mod invariants {
    use hs_core::{OrderId, TruckId};
    use hs_dispatch::{DispatchDecision, DispatchView, Dispatcher};

    use super::*;
    use crate::{NoopObserver, SimError};

    /// Hands every pending order to truck 0, even when it is already busy.
    struct OneTruckForAll;

    impl Dispatcher for OneTruckForAll {
        fn name(&self) -> &'static str {
            "one_truck_for_all"
        }

        fn decide(&self, view: &DispatchView<'_>) -> Vec<DispatchDecision> {
            view.fleet
                .pending_orders()
                .filter_map(|o| {
                    let route = view.router.route(view.network, W, o.destination).ok()?;
                    Some(DispatchDecision::Assign {
                        order:   o.id,
                        truck:   TruckId(0),
                        route,
                        pickup:  o.origin,
                        dropoff: o.destination,
                    })
                })
                .collect()
        }
    }

    /// Names an order that does not exist.
    struct Phantom;

    impl Dispatcher for Phantom {
        fn name(&self) -> &'static str {
            "phantom"
        }

        fn decide(&self, _view: &DispatchView<'_>) -> Vec<DispatchDecision> {
            vec![DispatchDecision::Cancel { order: OrderId(77), reason: hs_fleet::CancelReason::NoRoute }]
        }
    }

    #[test]
    fn double_booking_halts_the_run() {
        let mut sim = SimBuilder::new(config(2, 8 * 3_600))
            .network(corridor())
            .homes(vec![W])
            .orders(vec![order(C, 0, 86_400), order(C, 0, 86_400)])
            .generate_orders(false)
            .dispatcher(OneTruckForAll)
            .build()
            .unwrap();
        let err = sim.run(&mut NoopObserver).unwrap_err();
        assert!(matches!(err, SimError::InvariantViolation { time: 0, .. }), "{err}");
    }

    #[test]
    fn unknown_order_halts_the_run() {
        let mut sim = SimBuilder::new(config(1, 8 * 3_600))
            .network(corridor())
            .orders(vec![order(C, 0, 86_400)])
            .generate_orders(false)
            .dispatcher(Phantom)
            .build()
            .unwrap();
        assert!(matches!(sim.run(&mut NoopObserver), Err(SimError::InvariantViolation { .. })));
    }
}

// ── Snapshots ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod snapshots {
    use hs_core::{OrderId, TruckId};
    use hs_fleet::{OrderStatus, TruckState};

    use super::*;
    use crate::NoopObserver;

    #[test]
    fn mid_hop_position_is_interpolated() {
        let mut sim = corridor_sim(8 * 3_600, vec![order(C, 0, 86_400)]);
        sim.run(&mut NoopObserver).unwrap();

        let snap = sim.snapshot_at(SimTime(1_800));
        let truck = snap.truck(TruckId(0)).unwrap();
        assert_eq!(truck.state, TruckState::EnRoute);
        assert!((truck.pos.lon - 19.5).abs() < 1e-3, "{:?}", truck.pos);
        assert_eq!(snap.order(OrderId(0)).unwrap().status, OrderStatus::InTransit);
        assert_eq!(snap.nodes.len(), 3);
    }

    #[test]
    fn before_any_event_everything_is_home() {
        let mut sim = corridor_sim(8 * 3_600, vec![order(C, 50, 86_400)]);
        sim.run(&mut NoopObserver).unwrap();
        let snap = sim.snapshot_at(SimTime(10));
        assert!(snap.orders.is_empty());
        assert_eq!(snap.trucks_in(TruckState::Idle), 1);
        assert_eq!(snap.truck(TruckId(0)).unwrap().pos, GeoPoint::new(50.0, 19.0));
    }

    #[test]
    fn log_replay_matches_live_state() {
        let mut sim = SimBuilder::new(random_config(5)).build().unwrap();
        sim.run(&mut NoopObserver).unwrap();
        assert_eq!(sim.snapshot_at(sim.now()), sim.snapshot());
    }

    #[test]
    fn delivery_time_exposed() {
        let mut sim = corridor_sim(8 * 3_600, vec![order(C, 0, 1_000)]);
        sim.run(&mut NoopObserver).unwrap();
        // Deadline 1000 s, travel 3600 s: never assigned, cancelled at 1000.
        assert_eq!(sim.snapshot().order(OrderId(0)).unwrap().delivered_at, None);

        let mut sim = corridor_sim(8 * 3_600, vec![order(C, 0, 3_600)]);
        sim.run(&mut NoopObserver).unwrap();
        let view = sim.snapshot_at(sim.now()).order(OrderId(0)).cloned().unwrap();
        assert_eq!(view.delivered_at, Some(SimTime(3_600)));
        assert_eq!(view.lateness_secs(), 0);
    }
}

// ── Determinism & replications ────────────────────────────────────────────────

#[cfg(test)]
mod determinism {
    use super::*;
    use crate::{run_replications, NoopObserver};

    fn log_json(seed: u64) -> String {
        let mut sim = SimBuilder::new(random_config(seed)).build().unwrap();
        sim.run(&mut NoopObserver).unwrap();
        serde_json::to_string(sim.log()).unwrap()
    }

    #[test]
    fn same_seed_same_log() {
        assert_eq!(log_json(11), log_json(11));
    }

    #[test]
    fn replications_come_back_in_seed_order() {
        let seeds = [4, 2, 9];
        let reps = run_replications(&random_config(0), &seeds, |c| SimBuilder::new(c).build()).unwrap();
        let got: Vec<u64> = reps.iter().map(|r| r.seed).collect();
        assert_eq!(got, seeds);

        let mut again = SimBuilder::new(random_config(2)).build().unwrap();
        let summary = again.run(&mut NoopObserver).unwrap();
        assert_eq!(reps[1].summary, summary);
    }
}

// ── Property tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod properties {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use hs_core::{OrderId, TruckId};
    use hs_fleet::{OrderStatus, TruckState};

    use super::*;
    use crate::{Effect, NoopObserver};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn run_invariants_hold(seed in 0u64..10_000) {
            let cfg = random_config(seed);
            let max_drive = cfg.fleet.max_drive_secs;
            let mut sim = SimBuilder::new(cfg).build().unwrap();
            sim.run(&mut NoopObserver).unwrap();
            let records = sim.log().records();

            // Timestamps never go backwards.
            prop_assert!(records.windows(2).all(|w| w[0].time <= w[1].time));

            // No truck ever holds two live orders; no truck over its limit.
            let mut live: BTreeMap<OrderId, TruckId> = BTreeMap::new();
            for r in records {
                for e in &r.effects {
                    match e {
                        Effect::Order { order, status, truck } => match (status, truck) {
                            (OrderStatus::Assigned | OrderStatus::InTransit, Some(t)) => {
                                live.insert(*order, *t);
                            }
                            _ => {
                                live.remove(order);
                            }
                        },
                        Effect::Truck { drive_secs, .. } => prop_assert!(*drive_secs <= max_drive),
                    }
                }
                let mut per_truck: BTreeMap<TruckId, usize> = BTreeMap::new();
                for t in live.values() {
                    *per_truck.entry(*t).or_default() += 1;
                }
                prop_assert!(per_truck.values().all(|&n| n <= 1), "double booking at t={}", r.time);
            }

            // Replaying the log is idempotent and agrees with the engine.
            let mid = SimTime(sim.now().0 / 2);
            prop_assert_eq!(sim.snapshot_at(mid), sim.snapshot_at(mid));
            prop_assert_eq!(sim.snapshot_at(sim.now()), sim.snapshot());

            // Every delivered order went arrival → assignment → the carrying
            // truck reaching the destination and being handled → hand-over.
            for o in sim.fleet().orders().filter(|o| o.status == OrderStatus::Delivered) {
                let Some(truck) = o.truck else {
                    return Err(TestCaseError::fail(format!("{} delivered without a truck", o.id)));
                };
                let chain: Vec<&LogRecord> = sim.log().for_order(o.id).collect();
                prop_assert_eq!(chain.first().map(|r| r.event_type()), Some("order_arrival"));
                let last = chain.last().map(|r| &r.event);
                prop_assert_eq!(last, Some(&EventKind::DeliveryComplete { truck, order: o.id }));

                let assigned_seq = chain
                    .iter()
                    .find(|r| r.effects.iter().any(|e| matches!(
                        e,
                        Effect::Order { order, status: OrderStatus::Assigned, truck: Some(t) }
                            if *order == o.id && *t == truck
                    )))
                    .map(|r| (r.time, r.seq));
                let Some(assigned) = assigned_seq else {
                    return Err(TestCaseError::fail(format!("{} never assigned to {truck}", o.id)));
                };
                let delivered = chain.last().map(|r| (r.time, r.seq)).unwrap_or(assigned);
                prop_assert!(assigned < delivered);

                let between = |f: &dyn Fn(&EventKind) -> bool| {
                    records.iter().any(|r| {
                        let key = (r.time, r.seq);
                        key > assigned && key < delivered && r.event.truck() == Some(truck) && f(&r.event)
                    })
                };
                let dest = o.destination;
                prop_assert!(
                    between(&|e| matches!(e, EventKind::ArrivalAtNode { stop: Stop::Node(n), .. } if *n == dest)),
                    "{} delivered without {truck} reaching {dest}", o.id
                );
                prop_assert!(
                    between(&|e| matches!(e, EventKind::ServiceEnd { node, .. } if *node == dest)),
                    "{} delivered before handling at {dest}", o.id
                );
                prop_assert!(o.delivered_at.is_some());
            }

            // No facility ever handles more trucks than it has slots.
            let mut at: BTreeMap<TruckId, (TruckState, Option<NodeId>)> = BTreeMap::new();
            for r in records {
                for e in &r.effects {
                    if let Effect::Truck { truck, state, location, .. } = e {
                        at.insert(*truck, (*state, location.node()));
                    }
                }
                let mut servicing: BTreeMap<NodeId, u32> = BTreeMap::new();
                for (state, node) in at.values() {
                    if let (TruckState::Servicing, Some(n)) = (state, node) {
                        *servicing.entry(*n).or_default() += 1;
                    }
                }
                for (n, count) in servicing {
                    prop_assert!(count <= sim.network().capacity(n), "{n} over capacity at t={}", r.time);
                }
            }
        }
    }
}
