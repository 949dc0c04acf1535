//! Route model: legs, maneuvers and parsing of provider responses.

use serde::{Deserialize, Serialize};

use crate::error::NavError;
use crate::polyline::{DEFAULT_PRECISION, Polyline, RoutePoint};

const METERS_PER_KILOMETER: f64 = 1000.0;
const METERS_PER_MILE: f64 = 1609.344;

/// Travel profile understood by the routing provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Costing {
    Auto,
    #[default]
    Pedestrian,
    Bicycle,
}

/// Distance units for request narration and response lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Kilometers,
    Miles,
}

impl Units {
    pub fn to_meters(self, value: f64) -> f64 {
        match self {
            Units::Kilometers => value * METERS_PER_KILOMETER,
            Units::Miles => value * METERS_PER_MILE,
        }
    }
}

/// Maneuver categories, numbered as the provider numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManeuverKind {
    None,
    Start,
    StartRight,
    StartLeft,
    Destination,
    DestinationRight,
    DestinationLeft,
    Becomes,
    Continue,
    SlightRight,
    Right,
    SharpRight,
    UturnRight,
    UturnLeft,
    SharpLeft,
    Left,
    SlightLeft,
    RampStraight,
    RampRight,
    RampLeft,
    ExitRight,
    ExitLeft,
    StayStraight,
    StayRight,
    StayLeft,
    Merge,
    RoundaboutEnter,
    RoundaboutExit,
    FerryEnter,
    FerryExit,
    Transit,
    TransitTransfer,
    TransitRemainOn,
    TransitConnectionStart,
    TransitConnectionTransfer,
    TransitConnectionDestination,
    PostTransitConnectionDestination,
    MergeRight,
    MergeLeft,
}

impl ManeuverKind {
    const ALL: [ManeuverKind; 39] = [
        ManeuverKind::None,
        ManeuverKind::Start,
        ManeuverKind::StartRight,
        ManeuverKind::StartLeft,
        ManeuverKind::Destination,
        ManeuverKind::DestinationRight,
        ManeuverKind::DestinationLeft,
        ManeuverKind::Becomes,
        ManeuverKind::Continue,
        ManeuverKind::SlightRight,
        ManeuverKind::Right,
        ManeuverKind::SharpRight,
        ManeuverKind::UturnRight,
        ManeuverKind::UturnLeft,
        ManeuverKind::SharpLeft,
        ManeuverKind::Left,
        ManeuverKind::SlightLeft,
        ManeuverKind::RampStraight,
        ManeuverKind::RampRight,
        ManeuverKind::RampLeft,
        ManeuverKind::ExitRight,
        ManeuverKind::ExitLeft,
        ManeuverKind::StayStraight,
        ManeuverKind::StayRight,
        ManeuverKind::StayLeft,
        ManeuverKind::Merge,
        ManeuverKind::RoundaboutEnter,
        ManeuverKind::RoundaboutExit,
        ManeuverKind::FerryEnter,
        ManeuverKind::FerryExit,
        ManeuverKind::Transit,
        ManeuverKind::TransitTransfer,
        ManeuverKind::TransitRemainOn,
        ManeuverKind::TransitConnectionStart,
        ManeuverKind::TransitConnectionTransfer,
        ManeuverKind::TransitConnectionDestination,
        ManeuverKind::PostTransitConnectionDestination,
        ManeuverKind::MergeRight,
        ManeuverKind::MergeLeft,
    ];

    /// Maps a provider type code; unknown codes become `None`.
    pub fn from_code(code: i64) -> Self {
        usize::try_from(code)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .unwrap_or_else(|| {
                tracing::warn!(code, "unknown maneuver type code");
                ManeuverKind::None
            })
    }

    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn is_destination(self) -> bool {
        matches!(
            self,
            ManeuverKind::Destination
                | ManeuverKind::DestinationRight
                | ManeuverKind::DestinationLeft
        )
    }
}

/// Inclusive range of shape indices covered by a maneuver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeRange {
    pub begin: usize,
    pub end: usize,
}

/// One instruction step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Maneuver {
    pub kind: ManeuverKind,
    pub text: String,
    pub length_meters: f64,
    pub duration_seconds: f64,
    pub shape_range: ShapeRange,
}

impl Maneuver {
    /// Instruction text with markup stripped, ready for display or speech.
    pub fn clean_text(&self) -> String {
        clean_instruction(&self.text)
    }
}

/// One origin-to-destination segment of a route, with its decoded shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    encoded_shape: String,
    points: Polyline,
    maneuvers: Vec<Maneuver>,
    total_length_meters: f64,
    total_duration_seconds: f64,
}

impl Leg {
    /// Builds a leg, decoding its shape once.
    pub fn new(
        encoded_shape: impl Into<String>,
        precision: u32,
        maneuvers: Vec<Maneuver>,
        total_length_meters: f64,
        total_duration_seconds: f64,
    ) -> Result<Self, NavError> {
        let encoded_shape = encoded_shape.into();
        let points = Polyline::decode(&encoded_shape, precision)?;
        Ok(Self {
            encoded_shape,
            points,
            maneuvers,
            total_length_meters,
            total_duration_seconds,
        })
    }

    pub fn encoded_shape(&self) -> &str {
        &self.encoded_shape
    }

    pub fn points(&self) -> &[RoutePoint] {
        self.points.points()
    }

    pub fn maneuvers(&self) -> &[Maneuver] {
        &self.maneuvers
    }

    pub fn total_length_meters(&self) -> f64 {
        self.total_length_meters
    }

    pub fn total_duration_seconds(&self) -> f64 {
        self.total_duration_seconds
    }

    /// End point of a maneuver, if the shape actually reaches it.
    pub fn maneuver_end_point(&self, maneuver_index: usize) -> Option<&RoutePoint> {
        let maneuver = self.maneuvers.get(maneuver_index)?;
        self.points().get(maneuver.shape_range.end)
    }

    /// Length and time of the maneuvers after `maneuver_index`.
    pub fn remaining_from(&self, maneuver_index: usize) -> (f64, f64) {
        self.maneuvers
            .iter()
            .skip(maneuver_index + 1)
            .fold((0.0, 0.0), |(length, time), m| {
                (length + m.length_meters, time + m.duration_seconds)
            })
    }

    /// Checks shape ranges against the decoded shape. Returns the index of
    /// the first offending maneuver.
    pub fn first_inconsistent_maneuver(&self) -> Option<usize> {
        let point_count = self.points.len();
        let mut previous_end: Option<usize> = None;
        self.maneuvers.iter().position(|m| {
            let range = m.shape_range;
            let out_of_order = previous_end.is_some_and(|end| range.begin < end);
            previous_end = Some(range.end);
            range.begin > range.end || range.end >= point_count || out_of_order
        })
    }
}

/// A computed route. Immutable once parsed.
///
/// There is no status field: only successful responses become a `Route`.
/// Other statuses are reported as [`NavError::RouteProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    legs: Vec<Leg>,
    status_message: String,
}

impl Route {
    /// Builds a route, rejecting routes without legs or with an empty leg.
    pub fn new(legs: Vec<Leg>, status_message: impl Into<String>) -> Result<Self, NavError> {
        if legs.is_empty() || legs.iter().any(|leg| leg.maneuvers.is_empty()) {
            return Err(NavError::EmptyRoute);
        }

        for (index, leg) in legs.iter().enumerate() {
            if let Some(maneuver) = leg.first_inconsistent_maneuver() {
                tracing::warn!(
                    leg = index,
                    maneuver,
                    points = leg.points().len(),
                    "maneuver shape range does not match leg shape"
                );
            }
        }

        Ok(Self {
            legs,
            status_message: status_message.into(),
        })
    }

    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn total_length_meters(&self) -> f64 {
        self.legs.iter().map(Leg::total_length_meters).sum()
    }

    pub fn total_duration_seconds(&self) -> f64 {
        self.legs.iter().map(Leg::total_duration_seconds).sum()
    }
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    trip: Option<RawTrip>,
    error_code: Option<i64>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTrip {
    #[serde(default)]
    legs: Vec<RawLeg>,
    status: i64,
    #[serde(default)]
    status_message: String,
}

#[derive(Debug, Deserialize)]
struct RawLeg {
    #[serde(default)]
    shape: String,
    #[serde(default)]
    maneuvers: Vec<RawManeuver>,
    #[serde(default)]
    summary: RawSummary,
}

#[derive(Debug, Deserialize)]
struct RawManeuver {
    #[serde(rename = "type")]
    kind: i64,
    #[serde(default)]
    instruction: String,
    length: Option<f64>,
    #[serde(default)]
    time: f64,
    begin_shape_index: usize,
    end_shape_index: usize,
}

#[derive(Debug, Default, Deserialize)]
struct RawSummary {
    #[serde(default)]
    length: f64,
    #[serde(default)]
    time: f64,
}

/// Parses a provider response body at the default shape precision.
pub fn parse(raw: &str, units: Units) -> Result<Route, NavError> {
    parse_with_precision(raw, units, DEFAULT_PRECISION)
}

/// Parses a provider response body.
///
/// Lengths are converted from `units` to meters. A non-zero trip status,
/// or an error body, surfaces the provider's own code and message.
pub fn parse_with_precision(raw: &str, units: Units, precision: u32) -> Result<Route, NavError> {
    let response: RawResponse = serde_json::from_str(raw)?;

    let trip = match response.trip {
        Some(trip) => trip,
        None => {
            let code = response.error_code.unwrap_or(crate::error::TRANSPORT_FAILURE_CODE);
            let message = response
                .error
                .unwrap_or_else(|| "response has no trip".to_string());
            return Err(NavError::provider(code, message));
        }
    };

    if trip.status != 0 {
        return Err(NavError::provider(trip.status, trip.status_message));
    }

    let legs = trip
        .legs
        .into_iter()
        .map(|leg| {
            let maneuvers = leg
                .maneuvers
                .into_iter()
                .map(|m| Maneuver {
                    kind: ManeuverKind::from_code(m.kind),
                    text: m.instruction,
                    length_meters: units.to_meters(m.length.unwrap_or(0.0)),
                    duration_seconds: m.time,
                    shape_range: ShapeRange {
                        begin: m.begin_shape_index,
                        end: m.end_shape_index,
                    },
                })
                .collect::<Vec<_>>();
            if maneuvers.is_empty() {
                return Err(NavError::EmptyRoute);
            }
            Leg::new(
                leg.shape,
                precision,
                maneuvers,
                units.to_meters(leg.summary.length),
                leg.summary.time,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    Route::new(legs, trip.status_message)
}

/// Strips markup from instruction text and collapses whitespace.
pub fn clean_instruction(text: &str) -> String {
    let mut stripped = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => stripped.push(c),
            _ => {}
        }
    }

    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
