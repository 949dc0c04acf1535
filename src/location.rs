//! Device position fixes and the policy for trusting them.

use std::time::{Duration, SystemTime};

use serde::Deserialize;

use crate::error::NavError;
use crate::geo::{Location, Position};

const DEFAULT_FIX_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_FIX_AGE_SECS: u64 = 60;

/// A single device-reported position sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy radius in meters, when the device reports one.
    pub accuracy: Option<f64>,
    pub timestamp: SystemTime,
}

impl Fix {
    /// A fix taken now, without accuracy information.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
            timestamp: SystemTime::now(),
        }
    }

    pub fn with_accuracy(mut self, meters: f64) -> Self {
        self.accuracy = Some(meters);
        self
    }

    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Age of the fix relative to `now`. Fixes stamped in the future are zero-aged.
    pub fn age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.timestamp).unwrap_or(Duration::ZERO)
    }

    pub fn to_location(&self) -> Location {
        Location::new(self.latitude, self.longitude)
    }
}

impl Position for Fix {
    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// What a position stream delivers: a fix, or an out-of-band error.
pub type FixEvent = Result<Fix, NavError>;

/// Timing knobs for location acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Upper bound for a one-shot position read.
    pub fix_timeout_secs: u64,
    /// Oldest cached fix still accepted as the current position.
    pub max_fix_age_secs: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            fix_timeout_secs: DEFAULT_FIX_TIMEOUT_SECS,
            max_fix_age_secs: DEFAULT_MAX_FIX_AGE_SECS,
        }
    }
}

impl LocationConfig {
    pub fn fix_timeout(&self) -> Duration {
        Duration::from_secs(self.fix_timeout_secs)
    }

    pub fn max_fix_age(&self) -> Duration {
        Duration::from_secs(self.max_fix_age_secs)
    }

    /// Accepts `fix` as the current position, or reports it as too old.
    pub fn check_fresh(&self, fix: Fix, now: SystemTime) -> Result<Fix, NavError> {
        let age = fix.age(now);
        if age > self.max_fix_age() {
            return Err(NavError::LocationUnavailable(format!(
                "last fix is {}s old (limit {}s)",
                age.as_secs(),
                self.max_fix_age_secs
            )));
        }
        Ok(fix)
    }
}
