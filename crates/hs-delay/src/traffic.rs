//! Hour-of-day congestion multipliers.

use hs_core::SimTime;

/// Travel-time multiplier for each local hour (index 0 = midnight).
#[derive(Clone, Debug, PartialEq)]
pub struct TrafficProfile {
    hourly:          [f64; 24],
    start_unix_secs: i64,
}

impl TrafficProfile {
    /// `start_unix_secs` anchors `SimTime::ZERO` to a wall-clock instant so
    /// that hour 0 of the profile is local midnight.
    pub fn new(hourly: [f64; 24], start_unix_secs: i64) -> Self {
        Self { hourly, start_unix_secs }
    }

    /// A profile that never slows anything down.
    pub fn flat() -> Self {
        Self::new([1.0; 24], 0)
    }

    #[inline]
    pub fn factor_at(&self, now: SimTime) -> f64 {
        self.hourly[now.hour_of_day(self.start_unix_secs)]
    }

    /// Factor for an explicit hour.  Hours ≥ 24 wrap.
    #[inline]
    pub fn factor_for_hour(&self, hour: usize) -> f64 {
        self.hourly[hour % 24]
    }

    pub fn is_flat(&self) -> bool {
        self.hourly.iter().all(|f| *f == 1.0)
    }
}

impl Default for TrafficProfile {
    fn default() -> Self {
        Self::flat()
    }
}
