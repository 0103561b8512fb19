//! Run configuration.
//!
//! The engine consumes this surface but does not own it: applications load
//! it from JSON (or build it in code), call [`SimConfig::validate`], and hand
//! it to the simulation builder.  Every section has `#[serde(default)]` so a
//! config file only needs to name the values it changes.
//!
//! ```
//! use hs_core::SimConfig;
//!
//! let cfg = SimConfig::from_json_str(r#"{ "seed": 7, "fleet": { "size": 3 } }"#).unwrap();
//! assert_eq!(cfg.seed, 7);
//! assert_eq!(cfg.fleet.size, 3);
//! assert_eq!(cfg.fleet.rest_secs, 3_600);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::time::{SECS_PER_DAY, SECS_PER_HOUR, SECS_PER_MIN};
use crate::{CoreError, CoreResult, SimTime};

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Master RNG seed.  The same seed always produces an identical event log.
    pub seed: u64,

    /// Events with a timestamp beyond this are left unprocessed.
    pub horizon_secs: u64,

    /// Unix timestamp of `SimTime::ZERO`; drives time-of-day traffic.
    pub start_unix_secs: i64,

    pub network: NetworkParams,
    pub fleet:   FleetParams,
    pub orders:  OrderParams,
    pub delay:   DelayParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed:            42,
            horizon_secs:    7 * SECS_PER_DAY,
            start_unix_secs: 0,
            network:         NetworkParams::default(),
            fleet:           FleetParams::default(),
            orders:          OrderParams::default(),
            delay:           DelayParams::default(),
        }
    }
}

impl SimConfig {
    pub fn from_json_str(s: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_path(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// The simulated instant beyond which the run stops.
    #[inline]
    pub fn horizon(&self) -> SimTime {
        SimTime(self.horizon_secs)
    }

    /// Check every fail-fast condition.  Returns the first problem found.
    pub fn validate(&self) -> CoreResult<()> {
        if self.horizon_secs == 0 {
            return Err(config_err("horizon_secs must be positive"));
        }
        self.network.validate()?;
        self.fleet.validate()?;
        self.orders.validate()?;
        self.delay.validate()?;
        Ok(())
    }
}

fn config_err(msg: impl Into<String>) -> CoreError {
    CoreError::Config(msg.into())
}

fn check_range(name: &str, (lo, hi): (f64, f64)) -> CoreResult<()> {
    if !lo.is_finite() || !hi.is_finite() || lo > hi {
        return Err(config_err(format!("{name} must be a finite range with min <= max, got ({lo}, {hi})")));
    }
    Ok(())
}

// ── NetworkParams ─────────────────────────────────────────────────────────────

/// Random-topology parameters.  Ignored when the graph is supplied directly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkParams {
    pub node_count:  usize,
    /// Each node is joined (both directions) to this many nearest neighbours.
    pub k_neighbors: usize,
    /// Free-flow road speed used to derive base travel times.
    pub speed_kmh:   f64,
    /// Latitude band nodes are scattered in.
    pub lat_range:   (f32, f32),
    /// Longitude band nodes are scattered in.
    pub lon_range:   (f32, f32),
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self {
            node_count:  30,
            k_neighbors: 3,
            speed_kmh:   50.0,
            lat_range:   (45.0, 55.0),
            lon_range:   (9.0, 29.0),
        }
    }
}

impl NetworkParams {
    pub fn validate(&self) -> CoreResult<()> {
        if self.node_count < 2 {
            return Err(config_err(format!("network needs at least 2 nodes, got {}", self.node_count)));
        }
        if self.k_neighbors == 0 {
            return Err(config_err("k_neighbors must be positive"));
        }
        if !(self.speed_kmh.is_finite() && self.speed_kmh > 0.0) {
            return Err(config_err(format!("speed_kmh must be positive, got {}", self.speed_kmh)));
        }
        let (la, lb) = self.lat_range;
        let (oa, ob) = self.lon_range;
        check_range("lat_range", (la as f64, lb as f64))?;
        check_range("lon_range", (oa as f64, ob as f64))?;
        Ok(())
    }
}

// ── FleetParams ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetParams {
    pub size:           usize,
    /// Load capacity per truck, same unit as order size.
    pub capacity:       f64,
    /// Maximum continuous driving before a mandatory rest.
    pub max_drive_secs: u64,
    /// Length of the mandatory rest.
    pub rest_secs:      u64,
}

impl Default for FleetParams {
    fn default() -> Self {
        Self {
            size:           5,
            capacity:       10.0,
            max_drive_secs: 8 * SECS_PER_HOUR,
            rest_secs:      SECS_PER_HOUR,
        }
    }
}

impl FleetParams {
    pub fn validate(&self) -> CoreResult<()> {
        if self.size == 0 {
            return Err(config_err("fleet must contain at least one truck"));
        }
        if !(self.capacity.is_finite() && self.capacity > 0.0) {
            return Err(config_err(format!("truck capacity must be positive, got {}", self.capacity)));
        }
        if self.max_drive_secs == 0 {
            return Err(config_err("max_drive_secs must be positive"));
        }
        if self.rest_secs == 0 {
            return Err(config_err("rest_secs must be positive"));
        }
        Ok(())
    }
}

// ── OrderParams ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderParams {
    /// Mean order arrivals per simulated hour (Poisson process).
    pub rate_per_hour:       f64,
    /// Stop generating after this many orders; `None` = until the horizon.
    pub max_orders:          Option<usize>,
    /// Order size drawn uniformly from this range.
    pub size_range:          (f64, f64),
    /// Deadline = creation + a slack drawn uniformly from this range.
    pub deadline_slack_secs: (u64, u64),
}

impl Default for OrderParams {
    fn default() -> Self {
        Self {
            rate_per_hour:       2.0,
            max_orders:          None,
            size_range:          (1.0, 8.0),
            deadline_slack_secs: (4 * SECS_PER_HOUR, 24 * SECS_PER_HOUR),
        }
    }
}

impl OrderParams {
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.rate_per_hour.is_finite() && self.rate_per_hour >= 0.0) {
            return Err(config_err(format!("rate_per_hour must be non-negative, got {}", self.rate_per_hour)));
        }
        check_range("size_range", self.size_range)?;
        if self.size_range.0 <= 0.0 {
            return Err(config_err("order sizes must be positive"));
        }
        let (lo, hi) = self.deadline_slack_secs;
        if lo == 0 || lo > hi {
            return Err(config_err(format!("deadline_slack_secs must satisfy 0 < min <= max, got ({lo}, {hi})")));
        }
        Ok(())
    }
}

// ── DelayParams ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayParams {
    /// Travel-time multiplier per hour of day (index 0 = midnight).
    pub hourly_traffic:          [f64; 24],
    /// Weather noise: multiplier drawn uniformly from `[1, 1 + weather_noise]`.
    pub weather_noise:           f64,
    /// Chance that a hop is hit by a disruption on top of normal weather.
    pub disruption_prob:         f64,
    /// Extra multiplier added on disruption, drawn uniformly from this range.
    pub disruption_range:        (f64, f64),
    /// Extra handling time on top of facility service at inspection nodes.
    pub inspection_service_secs: u64,
    /// Lower clamp for any sampled travel duration.
    pub min_duration_secs:       u64,
    /// Erlang shape of the facility service time drawn at every node a truck
    /// arrives at.  `0` switches facility service off.
    pub service_shape:           u32,
    /// Mean of each Erlang phase, in seconds.
    pub service_scale_secs:      f64,
    /// Clamp applied to each facility service draw.
    pub service_clamp_secs:      (u64, u64),
}

impl Default for DelayParams {
    fn default() -> Self {
        let mut hourly_traffic = [1.0; 24];
        // Morning and evening peaks slow freight down.
        for h in [7, 8, 16, 17, 18] {
            hourly_traffic[h] = 1.4;
        }
        for slot in &mut hourly_traffic[9..16] {
            *slot = 1.15;
        }
        Self {
            hourly_traffic,
            weather_noise:           0.2,
            disruption_prob:         0.05,
            disruption_range:        (0.5, 2.0),
            inspection_service_secs: 20 * SECS_PER_MIN,
            min_duration_secs:       1,
            service_shape:           4,
            service_scale_secs:      35.0 * SECS_PER_MIN as f64,
            service_clamp_secs:      (60 * SECS_PER_MIN, 300 * SECS_PER_MIN),
        }
    }
}

impl DelayParams {
    /// Deterministic parameters: flat traffic, no weather, no disruptions,
    /// no facility service or inspection handling.  Durations equal base
    /// travel times.
    pub fn zero_variance() -> Self {
        Self {
            hourly_traffic:          [1.0; 24],
            weather_noise:           0.0,
            disruption_prob:         0.0,
            disruption_range:        (0.0, 0.0),
            inspection_service_secs: 0,
            min_duration_secs:       1,
            service_shape:           0,
            service_scale_secs:      0.0,
            service_clamp_secs:      (0, 0),
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if let Some((h, f)) = self
            .hourly_traffic
            .iter()
            .enumerate()
            .find(|(_, f)| !(f.is_finite() && **f > 0.0))
        {
            return Err(config_err(format!("hourly_traffic[{h}] must be positive, got {f}")));
        }
        if !(self.weather_noise.is_finite() && self.weather_noise >= 0.0) {
            return Err(config_err(format!("weather_noise must be non-negative, got {}", self.weather_noise)));
        }
        if !(0.0..=1.0).contains(&self.disruption_prob) {
            return Err(config_err(format!("disruption_prob must be in [0, 1], got {}", self.disruption_prob)));
        }
        check_range("disruption_range", self.disruption_range)?;
        if self.disruption_range.0 < 0.0 {
            return Err(config_err("disruption_range must be non-negative"));
        }
        if self.min_duration_secs == 0 {
            return Err(config_err("min_duration_secs must be at least 1"));
        }
        if self.service_shape > 0 {
            if !(self.service_scale_secs.is_finite() && self.service_scale_secs > 0.0) {
                return Err(config_err(format!(
                    "service_scale_secs must be positive when service_shape > 0, got {}",
                    self.service_scale_secs
                )));
            }
            let (lo, hi) = self.service_clamp_secs;
            if lo > hi {
                return Err(config_err(format!("service_clamp_secs must have min <= max, got ({lo}, {hi})")));
            }
        }
        Ok(())
    }
}
