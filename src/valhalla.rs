//! Valhalla HTTP adapter for turn-by-turn routes.

use serde::{Deserialize, Serialize};

use crate::error::NavError;
use crate::geo::Location;
use crate::polyline::DEFAULT_PRECISION;
use crate::route::{self, Costing, Route, Units};
use crate::traits::RoutingProvider;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValhallaConfig {
    pub base_url: String,
    /// Request timeout; `None` keeps the transport default.
    pub timeout_secs: Option<u64>,
}

impl Default for ValhallaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8002".to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestLocation {
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
}

impl From<&Location> for RequestLocation {
    fn from(location: &Location) -> Self {
        Self {
            lat: location.latitude,
            lon: location.longitude,
            street: location.label.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionsOptions {
    pub units: Units,
    pub narrative: bool,
    pub maneuver_types: bool,
}

/// Body of a route request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteRequest {
    pub locations: Vec<RequestLocation>,
    pub costing: Costing,
    pub directions_options: DirectionsOptions,
}

impl RouteRequest {
    pub fn new(start: &Location, end: &Location, costing: Costing, units: Units) -> Self {
        Self {
            locations: vec![start.into(), end.into()],
            costing,
            directions_options: DirectionsOptions {
                units,
                narrative: true,
                maneuver_types: true,
            },
        }
    }

    /// Inserts an intermediate stop before the destination.
    pub fn via(mut self, waypoint: &Location) -> Self {
        let at = self.locations.len().saturating_sub(1);
        self.locations.insert(at, waypoint.into());
        self
    }

    pub fn units(&self) -> Units {
        self.directions_options.units
    }
}

#[derive(Debug, Clone)]
pub struct ValhallaClient {
    config: ValhallaConfig,
    precision: u32,
    client: reqwest::blocking::Client,
}

impl ValhallaClient {
    pub fn new(config: ValhallaConfig) -> Result<Self, NavError> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self {
            config,
            precision: DEFAULT_PRECISION,
            client,
        })
    }

    /// Shape precision the server was configured with.
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    fn route_url(&self) -> String {
        format!("{}/route", self.config.base_url.trim_end_matches('/'))
    }
}

impl RoutingProvider for ValhallaClient {
    fn route(&self, request: &RouteRequest) -> Result<Route, NavError> {
        let url = self.route_url();
        tracing::debug!(%url, costing = ?request.costing, "requesting route");

        let response = self.client.post(&url).json(request).send()?;
        let status = response.status();
        let body = response.text()?;

        // Error bodies carry the provider's own code and message, which
        // the parser surfaces; only fall back to the HTTP status without one.
        match route::parse_with_precision(&body, request.units(), self.precision) {
            Err(NavError::RouteProvider { code, .. })
                if !status.is_success() && code == crate::error::TRANSPORT_FAILURE_CODE =>
            {
                tracing::warn!(%status, "routing provider returned unreadable error body");
                Err(NavError::provider(i64::from(status.as_u16()), body))
            }
            result => result,
        }
    }
}
