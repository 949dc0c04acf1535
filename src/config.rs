//! Aggregated configuration for a navigation client.

use std::path::Path;

use serde::Deserialize;

use crate::error::NavError;
use crate::location::LocationConfig;
use crate::polyline::{DEFAULT_PRECISION, MAX_PRECISION};
use crate::route::{Costing, Units};
use crate::tracker::TrackerConfig;
use crate::valhalla::{ValhallaClient, ValhallaConfig};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    pub routing: ValhallaConfig,
    pub tracker: TrackerConfig,
    pub location: LocationConfig,
    pub polyline_precision: u32,
    pub default_costing: Costing,
    pub default_units: Units,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            routing: ValhallaConfig::default(),
            tracker: TrackerConfig::default(),
            location: LocationConfig::default(),
            polyline_precision: DEFAULT_PRECISION,
            default_costing: Costing::default(),
            default_units: Units::default(),
        }
    }
}

impl NavConfig {
    /// Parses JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, NavError> {
        let config: NavConfig =
            serde_json::from_str(json).map_err(|err| NavError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, NavError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|err| NavError::InvalidConfig(format!("{}: {err}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// Routing client for this configuration.
    pub fn routing_client(&self) -> Result<ValhallaClient, NavError> {
        Ok(ValhallaClient::new(self.routing.clone())?.with_precision(self.polyline_precision))
    }

    pub fn validate(&self) -> Result<(), NavError> {
        let threshold = self.tracker.advance_threshold_meters;
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(NavError::InvalidConfig(format!(
                "advance_threshold_meters must be positive, got {threshold}"
            )));
        }
        if self.polyline_precision > MAX_PRECISION {
            return Err(NavError::InvalidConfig(format!(
                "polyline_precision must be at most {MAX_PRECISION}, got {}",
                self.polyline_precision
            )));
        }
        if self.routing.base_url.trim().is_empty() {
            return Err(NavError::InvalidConfig("routing.base_url is empty".to_string()));
        }
        Ok(())
    }
}
