//! Per-hop duration sampling.
//!
//! ```text
//! travel  = max(min_duration, round(base × traffic(hour) × weather))
//! weather = 1 + U[0, weather_noise] (+ U[disruption_range] with p = disruption_prob)
//! service = clamp(Erlang(service_shape, service_scale), service_clamp)
//!         + inspection_service_secs  if the hop ends at an Inspection node
//! ```
//!
//! Travel and service are kept apart: the truck drives for `travel_secs`
//! and then waits its turn at the target facility for `service_secs`, which
//! never counts towards the drive limit.
//!
//! The number of draws per hop depends only on the parameters and on whether
//! a disruption fires, so a fixed seed replays the same sequence.

use hs_core::{DelayParams, EdgeId, NodeKind, SimRng, SimTime};
use hs_network::NetworkGraph;

use crate::TrafficProfile;

/// One sampled hop.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HopTiming {
    /// Driving time in seconds.  Always ≥ the configured minimum.
    pub travel_secs:  u64,
    /// Handling time at the hop's target facility, spent after arrival.
    pub service_secs: u64,
    /// The multiplier applied to the base time (traffic × weather).
    pub multiplier:   f64,
    pub disrupted:    bool,
}

impl HopTiming {
    /// Departure to ready-to-leave: travel plus handling.
    pub fn total_secs(&self) -> u64 {
        self.travel_secs + self.service_secs
    }
}

/// Stochastic travel-time model.  Cheap to clone; holds no RNG state.
#[derive(Clone, Debug)]
pub struct DelayModel {
    traffic:          TrafficProfile,
    weather_noise:    f64,
    disruption_prob:  f64,
    disruption_range: (f64, f64),
    inspection_secs:  u64,
    min_secs:         u64,
    service_shape:    u32,
    service_scale:    f64,
    service_clamp:    (u64, u64),
}

impl DelayModel {
    /// Build from validated parameters.
    pub fn new(params: &DelayParams, start_unix_secs: i64) -> Self {
        Self {
            traffic:          TrafficProfile::new(params.hourly_traffic, start_unix_secs),
            weather_noise:    params.weather_noise,
            disruption_prob:  params.disruption_prob,
            disruption_range: params.disruption_range,
            inspection_secs:  params.inspection_service_secs,
            min_secs:         params.min_duration_secs.max(1),
            service_shape:    params.service_shape,
            service_scale:    params.service_scale_secs,
            service_clamp:    params.service_clamp_secs,
        }
    }

    /// Durations always equal base travel times and no facility service is
    /// drawn.
    pub fn deterministic() -> Self {
        Self::new(&DelayParams::zero_variance(), 0)
    }

    pub fn traffic(&self) -> &TrafficProfile {
        &self.traffic
    }

    /// Sample the full timing of driving `edge` starting at `now`.
    pub fn sample(&self, network: &NetworkGraph, edge: EdgeId, now: SimTime, rng: &mut SimRng) -> HopTiming {
        let base = network.base_secs(edge) as f64;

        let mut weather = 1.0;
        if self.weather_noise > 0.0 {
            weather += rng.random::<f64>() * self.weather_noise;
        }
        let disrupted = self.disruption_prob > 0.0 && rng.gen_bool(self.disruption_prob);
        if disrupted {
            let (lo, hi) = self.disruption_range;
            weather += if hi > lo { rng.gen_range(lo..hi) } else { lo };
        }

        let multiplier = self.traffic.factor_at(now) * weather;
        let travel_secs = ((base * multiplier).round() as u64).max(self.min_secs);

        let service_secs = self.service_at(network.kind(network.edge_target(edge)), rng);

        HopTiming { travel_secs, service_secs, multiplier, disrupted }
    }

    fn service_at(&self, kind: NodeKind, rng: &mut SimRng) -> u64 {
        let mut secs = 0;
        if self.service_shape > 0 {
            let (lo, hi) = self.service_clamp;
            let draw = rng.erlang(self.service_shape, self.service_scale).round() as u64;
            secs = draw.clamp(lo, hi);
        }
        if kind == NodeKind::Inspection {
            secs += self.inspection_secs;
        }
        secs
    }
}
