//! Simulated time.
//!
//! # Design
//!
//! Time is an absolute count of simulated **seconds** since the start of the
//! run, held in `SimTime`.  Integer seconds keep event ordering exact (no
//! floating-point ties that compare differently across runs) while still
//! being far finer than any logistics process the engine models.
//!
//! Durations are plain `u64` seconds, mirroring how `SimTime - SimTime`
//! yields a `u64`.  The wall-clock mapping (`start_unix_secs + secs`) is only
//! needed for time-of-day effects and lives in [`SimTime::hour_of_day`].

use std::fmt;

use serde::{Deserialize, Serialize};

pub const SECS_PER_MIN: u64 = 60;
pub const SECS_PER_HOUR: u64 = 3_600;
pub const SECS_PER_DAY: u64 = 86_400;

/// An absolute instant in simulated time (seconds since run start).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);
    pub const MAX: SimTime = SimTime(u64::MAX);

    #[inline]
    pub fn from_mins(mins: u64) -> SimTime {
        SimTime(mins * SECS_PER_MIN)
    }

    #[inline]
    pub fn from_hours(hours: u64) -> SimTime {
        SimTime(hours * SECS_PER_HOUR)
    }

    #[inline]
    pub fn secs(self) -> u64 {
        self.0
    }

    /// Fractional minutes, for reporting.
    #[inline]
    pub fn as_mins_f64(self) -> f64 {
        self.0 as f64 / SECS_PER_MIN as f64
    }

    /// The instant `secs` seconds after `self` (saturating at `MAX`).
    #[inline]
    pub fn after(self, secs: u64) -> SimTime {
        SimTime(self.0.saturating_add(secs))
    }

    /// Seconds elapsed from `earlier` to `self`, or 0 if `earlier` is later.
    #[inline]
    pub fn since(self, earlier: SimTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Local hour of day (0–23) given the Unix timestamp of `SimTime::ZERO`.
    pub fn hour_of_day(self, start_unix_secs: i64) -> usize {
        let wall = start_unix_secs.saturating_add(self.0 as i64);
        (wall.rem_euclid(SECS_PER_DAY as i64) / SECS_PER_HOUR as i64) as usize
    }

    /// Break the instant into (day, hour, minute, second) from run start.
    pub fn dhms(self) -> (u64, u32, u32, u32) {
        let days = self.0 / SECS_PER_DAY;
        let hours = ((self.0 % SECS_PER_DAY) / SECS_PER_HOUR) as u32;
        let minutes = ((self.0 % SECS_PER_HOUR) / SECS_PER_MIN) as u32;
        let seconds = (self.0 % SECS_PER_MIN) as u32;
        (days, hours, minutes, seconds)
    }
}

impl std::ops::Add<u64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: u64) -> SimTime {
        SimTime(self.0 + rhs)
    }
}

impl std::ops::Sub for SimTime {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: SimTime) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (d, h, m, s) = self.dhms();
        write!(f, "d{d} {h:02}:{m:02}:{s:02}")
    }
}
