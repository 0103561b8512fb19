//! Unit tests for hs-delay.

#[cfg(test)]
mod helpers {
    use hs_core::{GeoPoint, NodeId, NodeKind};
    use hs_network::{NetworkBuilder, NetworkGraph};

    /// W —(3600 s)→ C and W —(600 s)→ I (inspection).
    pub fn net() -> (NetworkGraph, [NodeId; 3]) {
        let mut b = NetworkBuilder::new();
        let w = b.add_node(GeoPoint::new(50.0, 19.0), NodeKind::Warehouse);
        let c = b.add_node(GeoPoint::new(50.5, 19.0), NodeKind::Customer);
        let i = b.add_node(GeoPoint::new(50.0, 19.5), NodeKind::Inspection);
        b.add_link(w, c, 50_000.0, 3_600);
        b.add_link(w, i, 8_000.0, 600);
        (b.build().unwrap(), [w, c, i])
    }
}

#[cfg(test)]
mod traffic {
    use hs_core::SimTime;

    use crate::TrafficProfile;

    #[test]
    fn flat_profile() {
        let p = TrafficProfile::flat();
        assert!(p.is_flat());
        assert_eq!(p.factor_at(SimTime::from_hours(8)), 1.0);
    }

    #[test]
    fn start_offset_shifts_hours() {
        let mut hourly = [1.0; 24];
        hourly[8] = 1.5;
        // Run starts at 07:00, so one simulated hour in it is 08:00.
        let p = TrafficProfile::new(hourly, 7 * 3_600);
        assert_eq!(p.factor_at(SimTime::ZERO), 1.0);
        assert_eq!(p.factor_at(SimTime::from_hours(1)), 1.5);
        assert_eq!(p.factor_for_hour(32), 1.5);
    }
}

#[cfg(test)]
mod model {
    use hs_core::{DelayParams, SimRng, SimTime};

    use crate::DelayModel;

    #[test]
    fn deterministic_equals_base() {
        let (net, [w, c, _]) = super::helpers::net();
        let e = net.edge_between(w, c).unwrap();
        let model = DelayModel::deterministic();
        let mut rng = SimRng::new(1);
        for h in 0..24 {
            assert_eq!(model.sample(&net, e, SimTime::from_hours(h), &mut rng).travel_secs, 3_600);
        }
    }

    #[test]
    fn rush_hour_is_slower() {
        let (net, [w, c, _]) = super::helpers::net();
        let e = net.edge_between(w, c).unwrap();
        let mut params = DelayParams::zero_variance();
        params.hourly_traffic[8] = 1.5;
        let model = DelayModel::new(&params, 0);
        let mut rng = SimRng::new(1);
        assert_eq!(model.sample(&net, e, SimTime::from_hours(8), &mut rng).travel_secs, 5_400);
        assert_eq!(model.sample(&net, e, SimTime::from_hours(3), &mut rng).travel_secs, 3_600);
    }

    #[test]
    fn inspection_adds_service_time() {
        let (net, [w, _, i]) = super::helpers::net();
        let mut params = DelayParams::zero_variance();
        params.inspection_service_secs = 1_200;
        let model = DelayModel::new(&params, 0);
        let mut rng = SimRng::new(1);

        let into = model.sample(&net, net.edge_between(w, i).unwrap(), SimTime::ZERO, &mut rng);
        assert_eq!(into.travel_secs, 600);
        assert_eq!(into.service_secs, 1_200);

        let out = model.sample(&net, net.edge_between(i, w).unwrap(), SimTime::ZERO, &mut rng);
        assert_eq!(out.service_secs, 0);
    }

    #[test]
    fn facility_service_is_clamped_and_separate_from_travel() {
        let (net, [w, c, i]) = super::helpers::net();
        let mut params = DelayParams::zero_variance();
        params.service_shape = 4;
        params.service_scale_secs = 35.0;
        params.service_clamp_secs = (60, 300);
        params.inspection_service_secs = 1_000;
        let model = DelayModel::new(&params, 0);
        let mut rng = SimRng::new(4);

        for _ in 0..500 {
            let hop = model.sample(&net, net.edge_between(w, c).unwrap(), SimTime::ZERO, &mut rng);
            assert_eq!(hop.travel_secs, 3_600);
            assert!((60..=300).contains(&hop.service_secs), "got {}", hop.service_secs);

            let hop = model.sample(&net, net.edge_between(w, i).unwrap(), SimTime::ZERO, &mut rng);
            assert_eq!(hop.travel_secs, 600);
            assert!((1_060..=1_300).contains(&hop.service_secs), "got {}", hop.service_secs);
            assert_eq!(hop.total_secs(), 600 + hop.service_secs);
        }
    }

    #[test]
    fn deterministic_draws_no_service() {
        let (net, [w, c, _]) = super::helpers::net();
        let e = net.edge_between(w, c).unwrap();
        let hop = DelayModel::deterministic().sample(&net, e, SimTime::ZERO, &mut SimRng::new(1));
        assert_eq!(hop.service_secs, 0);
    }

    #[test]
    fn weather_stays_in_band() {
        let (net, [w, c, _]) = super::helpers::net();
        let e = net.edge_between(w, c).unwrap();
        let mut params = DelayParams::zero_variance();
        params.weather_noise = 0.5;
        let model = DelayModel::new(&params, 0);
        let mut rng = SimRng::new(9);
        for _ in 0..500 {
            let d = model.sample(&net, e, SimTime::ZERO, &mut rng).travel_secs;
            assert!((3_600..=5_400).contains(&d), "got {d}");
        }
    }

    #[test]
    fn certain_disruption_always_fires() {
        let (net, [w, c, _]) = super::helpers::net();
        let e = net.edge_between(w, c).unwrap();
        let mut params = DelayParams::zero_variance();
        params.disruption_prob = 1.0;
        params.disruption_range = (1.0, 1.0);
        let model = DelayModel::new(&params, 0);
        let hop = model.sample(&net, e, SimTime::ZERO, &mut SimRng::new(2));
        assert!(hop.disrupted);
        assert_eq!(hop.travel_secs, 7_200);
    }

    #[test]
    fn same_stream_same_samples() {
        let (net, [w, c, _]) = super::helpers::net();
        let e = net.edge_between(w, c).unwrap();
        let model = DelayModel::new(&DelayParams::default(), 0);
        let mut a = SimRng::new(77);
        let mut b = SimRng::new(77);
        for h in 0..48 {
            let t = SimTime::from_hours(h);
            assert_eq!(model.sample(&net, e, t, &mut a), model.sample(&net, e, t, &mut b));
        }
    }
}

#[cfg(test)]
mod properties {
    use hs_core::{DelayParams, SimRng, SimTime};
    use proptest::prelude::*;

    use crate::DelayModel;

    proptest! {
        #[test]
        fn travel_never_below_minimum(
            seed in any::<u64>(),
            secs in 0u64..1_000_000,
            noise in 0.0f64..3.0,
            prob in 0.0f64..=1.0,
            min in 1u64..120,
        ) {
            let (net, [w, c, _]) = super::helpers::net();
            let e = net.edge_between(w, c).unwrap();
            let params = DelayParams {
                weather_noise: noise,
                disruption_prob: prob,
                min_duration_secs: min,
                ..DelayParams::default()
            };
            let model = DelayModel::new(&params, 0);
            let d = model.sample(&net, e, SimTime(secs), &mut SimRng::new(seed)).travel_secs;
            prop_assert!(d >= min);
            prop_assert!(d >= 1);
        }
    }
}
