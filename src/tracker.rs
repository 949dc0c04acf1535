//! Route progress tracking.
//!
//! Turns a stream of noisy position fixes into "which maneuver is current"
//! and "how far until it is done".
//!
//! # State Machine
//!
//! ```text
//! Idle --load(route)--> Tracking
//! Tracking --fix within threshold of maneuver end--> Tracking (cursor + 1)
//! Tracking --reset()--> Idle
//! ```
//!
//! The cursor only moves forward, by at most one maneuver per fix. Reaching
//! the final maneuver does not leave `Tracking`; the owner decides whether
//! arrival ends the session.

use serde::Deserialize;

use crate::error::NavError;
use crate::geo::{Position, distance_meters};
use crate::route::{Maneuver, Route};

/// Distance to a maneuver's end point below which it counts as done.
pub const DEFAULT_ADVANCE_THRESHOLD_METERS: f64 = 8.0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub advance_threshold_meters: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            advance_threshold_meters: DEFAULT_ADVANCE_THRESHOLD_METERS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    Tracking,
}

/// Position within a route: leg index and maneuver index within that leg.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cursor {
    pub leg: usize,
    pub maneuver: usize,
}

/// A maneuver that just became current and should be announced.
#[derive(Debug, Clone, PartialEq)]
pub struct Announcement {
    pub cursor: Cursor,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    /// The cursor moved one step. `announcement` is `None` when this
    /// maneuver was already announced.
    Advanced {
        cursor: Cursor,
        announcement: Option<Announcement>,
    },
    /// Within threshold of the final maneuver's end. Emitted once.
    Arrived,
}

/// Mutable state of one navigation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationSession {
    pub is_active: bool,
    pub route: Option<Route>,
    pub cursor: Cursor,
    /// `None` until the first fix has been measured against the current maneuver.
    pub distance_to_maneuver_end_meters: Option<f64>,
    pub last_announced: Option<Cursor>,
    pub arrived: bool,
    pub last_error: Option<NavError>,
}

impl NavigationSession {
    pub fn leg_index(&self) -> usize {
        self.cursor.leg
    }

    pub fn maneuver_index(&self) -> usize {
        self.cursor.maneuver
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    config: TrackerConfig,
    session: NavigationSession,
}

impl ProgressTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            session: NavigationSession::default(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn state(&self) -> TrackerState {
        if self.session.is_active {
            TrackerState::Tracking
        } else {
            TrackerState::Idle
        }
    }

    pub fn session(&self) -> &NavigationSession {
        &self.session
    }

    pub fn has_arrived(&self) -> bool {
        self.session.arrived
    }

    /// Records an error for display without touching progress.
    pub fn set_last_error(&mut self, error: Option<NavError>) {
        self.session.last_error = error;
    }

    /// Starts tracking `route` from its first maneuver.
    pub fn load(&mut self, route: Route) {
        self.session = NavigationSession {
            is_active: true,
            route: Some(route),
            ..NavigationSession::default()
        };
    }

    /// Back to `Idle` with an empty session.
    pub fn reset(&mut self) {
        self.session = NavigationSession::default();
    }

    /// The maneuver at the cursor, if tracking and the cursor resolves.
    pub fn current_instruction(&self) -> Option<&Maneuver> {
        if !self.session.is_active {
            return None;
        }
        let route = self.session.route.as_ref()?;
        let cursor = self.session.cursor;
        route.legs().get(cursor.leg)?.maneuvers().get(cursor.maneuver)
    }

    /// Remaining length (m) and time (s) after the current maneuver,
    /// including later legs.
    pub fn remaining_after_current(&self) -> Option<(f64, f64)> {
        self.current_instruction()?;
        let route = self.session.route.as_ref()?;
        let cursor = self.session.cursor;
        let (mut length, mut time) = route.legs().get(cursor.leg)?.remaining_from(cursor.maneuver);
        for leg in route.legs().iter().skip(cursor.leg + 1) {
            length += leg.total_length_meters();
            time += leg.total_duration_seconds();
        }
        Some((length, time))
    }

    /// Measures `fix` against the current maneuver and advances if done.
    ///
    /// All session fields change together at the end of the call. After an
    /// advance the distance is measured to the new maneuver's end, or is
    /// `None` when that end lies outside the shape, so it never pairs a
    /// stale distance with the new cursor.
    pub fn update<P: Position + ?Sized>(&mut self, fix: &P) -> Option<TrackerEvent> {
        if !self.session.is_active {
            return None;
        }
        let route = self.session.route.as_ref()?;
        let cursor = self.session.cursor;
        let leg = route.legs().get(cursor.leg)?;
        leg.maneuvers().get(cursor.maneuver)?;

        let Some(end_point) = leg.maneuver_end_point(cursor.maneuver) else {
            tracing::warn!(
                leg = cursor.leg,
                maneuver = cursor.maneuver,
                "maneuver end lies outside the leg shape, keeping previous distance"
            );
            return None;
        };

        let distance = distance_meters(fix, end_point);
        let mut next = cursor;
        let mut arrived_now = false;

        if distance < self.config.advance_threshold_meters {
            if cursor.maneuver + 1 < leg.maneuvers().len() {
                next.maneuver += 1;
            } else if cursor.leg + 1 < route.legs().len() {
                next = Cursor {
                    leg: cursor.leg + 1,
                    maneuver: 0,
                };
            } else if !self.session.arrived {
                arrived_now = true;
            }
        }

        if arrived_now {
            tracing::info!(distance, "arrived at destination");
            self.session.distance_to_maneuver_end_meters = Some(distance);
            self.session.arrived = true;
            return Some(TrackerEvent::Arrived);
        }

        if next == cursor {
            self.session.distance_to_maneuver_end_meters = Some(distance);
            return None;
        }

        let next_leg = &route.legs()[next.leg];
        let maneuver = &next_leg.maneuvers()[next.maneuver];
        let next_distance = next_leg
            .maneuver_end_point(next.maneuver)
            .map(|point| distance_meters(fix, point));
        let announcement = (self.session.last_announced.is_none_or(|last| next > last))
            .then(|| Announcement {
                cursor: next,
                text: maneuver.clean_text(),
            });

        tracing::debug!(
            leg = next.leg,
            maneuver = next.maneuver,
            kind = ?maneuver.kind,
            "advanced to next maneuver"
        );

        self.session.cursor = next;
        self.session.distance_to_maneuver_end_meters = next_distance;
        if announcement.is_some() {
            self.session.last_announced = Some(next);
        }

        Some(TrackerEvent::Advanced {
            cursor: next,
            announcement,
        })
    }
}
