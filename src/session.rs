//! Navigation session lifecycle.
//!
//! [`NavigationController`] owns one navigation: it requests the route,
//! feeds position fixes into the [`ProgressTracker`] and forwards
//! announcements to the speech gate.
//!
//! Two guards keep late callbacks from touching newer state:
//!
//! - every route request takes a sequence number; a response is applied only
//!   if its number is still the latest issued (`stop_session` also bumps it);
//! - every subscription carries the generation it was created for; fixes
//!   from an older generation are ignored.
//!
//! Lock order is subscription slot, then shared state.

use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;

use crate::config::NavConfig;
use crate::error::NavError;
use crate::geo::Location;
use crate::location::{FixEvent, LocationConfig};
use crate::route::{Costing, Maneuver, Units};
use crate::speech::SpeechGate;
use crate::tracker::{
    Announcement, Cursor, ProgressTracker, TrackerConfig, TrackerEvent, TrackerState,
};
use crate::traits::{PositionSource, RoutingProvider, Subscription};
use crate::valhalla::RouteRequest;

/// A consistent read of the session for display.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationSnapshot {
    pub state: TrackerState,
    pub loading: bool,
    pub cursor: Cursor,
    pub instruction: Option<Maneuver>,
    pub distance_to_maneuver_end_meters: Option<f64>,
    /// Length (m) and time (s) left after the current maneuver.
    pub remaining_after_current: Option<(f64, f64)>,
    pub arrived: bool,
    pub last_error: Option<NavError>,
}

#[derive(Debug)]
struct Shared {
    tracker: ProgressTracker,
    loading: bool,
    latest_request: u64,
    generation: u64,
}

pub struct NavigationController<P, S> {
    provider: P,
    positions: S,
    location: LocationConfig,
    costing: Costing,
    units: Units,
    speech: SpeechGate,
    shared: Arc<Mutex<Shared>>,
    subscription: Mutex<Option<Box<dyn Subscription>>>,
}

impl<P, S> NavigationController<P, S>
where
    P: RoutingProvider,
    S: PositionSource,
{
    pub fn new(
        provider: P,
        positions: S,
        speech: SpeechGate,
        tracker: TrackerConfig,
        location: LocationConfig,
    ) -> Self {
        Self {
            provider,
            positions,
            location,
            costing: Costing::default(),
            units: Units::default(),
            speech,
            shared: Arc::new(Mutex::new(Shared {
                tracker: ProgressTracker::new(tracker),
                loading: false,
                latest_request: 0,
                generation: 0,
            })),
            subscription: Mutex::new(None),
        }
    }

    /// Builds a controller whose default profile and units come from `config`.
    pub fn from_config(provider: P, positions: S, speech: SpeechGate, config: &NavConfig) -> Self {
        let mut controller = Self::new(
            provider,
            positions,
            speech,
            config.tracker.clone(),
            config.location.clone(),
        );
        controller.costing = config.default_costing;
        controller.units = config.default_units;
        controller
    }

    /// [`start_session`](Self::start_session) with the default profile and units.
    pub fn navigate(&self, start: &Location, end: &Location) -> Result<(), NavError> {
        self.start_session(start, end, self.costing, self.units)
    }

    /// Requests a route and, on success, starts tracking live fixes.
    ///
    /// Any running session is torn down first. If another request or a
    /// stop happens while this one is in flight, its result is discarded
    /// and `RequestSuperseded` is returned.
    pub fn start_session(
        &self,
        start: &Location,
        end: &Location,
        costing: Costing,
        units: Units,
    ) -> Result<(), NavError> {
        let request = RouteRequest::new(start, end, costing, units);
        self.start_with_request(&request)
    }

    /// Like [`start_session`](Self::start_session), starting from a one-shot
    /// device fix that must be fresh enough.
    pub fn start_from_current_position(
        &self,
        end: &Location,
        costing: Costing,
        units: Units,
    ) -> Result<(), NavError> {
        let start = self
            .positions
            .current_fix(&self.location)
            .and_then(|fix| self.location.check_fresh(fix, SystemTime::now()));

        match start {
            Ok(fix) => self.start_session(&fix.to_location(), end, costing, units),
            Err(err) => {
                tracing::warn!(error = %err, "cannot determine start position");
                self.shared.lock().tracker.set_last_error(Some(err.clone()));
                Err(err)
            }
        }
    }

    /// Runs a prepared request, for trips with intermediate waypoints.
    pub fn start_with_request(&self, request: &RouteRequest) -> Result<(), NavError> {
        let sequence = {
            let mut slot = self.subscription.lock();
            release(&mut slot);
            let mut shared = self.shared.lock();
            shared.generation += 1;
            shared.latest_request += 1;
            shared.tracker.reset();
            shared.loading = true;
            shared.latest_request
        };
        tracing::info!(sequence, locations = request.locations.len(), "requesting route");

        let result = self.provider.route(request);

        let mut slot = self.subscription.lock();
        let generation = {
            let mut shared = self.shared.lock();
            if shared.latest_request != sequence {
                tracing::debug!(
                    sequence,
                    latest = shared.latest_request,
                    "discarding superseded route response"
                );
                return Err(NavError::RequestSuperseded);
            }
            shared.loading = false;

            match result {
                Ok(route) => {
                    shared.tracker.load(route);
                    shared.generation += 1;
                    shared.generation
                }
                Err(err) => {
                    tracing::warn!(error = %err, "route request failed");
                    shared.tracker.set_last_error(Some(err.clone()));
                    return Err(err);
                }
            }
        };

        let callback = fix_callback(Arc::clone(&self.shared), generation, self.speech.clone());
        match self.positions.subscribe(callback) {
            Ok(subscription) => {
                release(&mut slot);
                *slot = Some(subscription);
                tracing::info!(generation, "navigation started");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "position subscription failed");
                let mut shared = self.shared.lock();
                shared.generation += 1;
                shared.tracker.reset();
                shared.tracker.set_last_error(Some(err.clone()));
                Err(err)
            }
        }
    }

    /// Ends the session. Safe to call when nothing is running.
    ///
    /// The subscription is cancelled before state is reset, and once this
    /// returns no fix can change the session.
    pub fn stop_session(&self) {
        let mut slot = self.subscription.lock();
        release(&mut slot);
        let mut shared = self.shared.lock();
        shared.generation += 1;
        shared.latest_request += 1;
        shared.loading = false;
        shared.tracker.reset();
        tracing::info!("navigation stopped");
    }

    pub fn state(&self) -> TrackerState {
        self.shared.lock().tracker.state()
    }

    pub fn is_loading(&self) -> bool {
        self.shared.lock().loading
    }

    pub fn has_arrived(&self) -> bool {
        self.shared.lock().tracker.has_arrived()
    }

    pub fn last_error(&self) -> Option<NavError> {
        self.shared.lock().tracker.session().last_error.clone()
    }

    pub fn has_subscription(&self) -> bool {
        self.subscription.lock().is_some()
    }

    /// The maneuver at the cursor, or `None` when idle.
    pub fn current_instruction(&self) -> Option<Maneuver> {
        self.shared.lock().tracker.current_instruction().cloned()
    }

    pub fn snapshot(&self) -> NavigationSnapshot {
        let shared = self.shared.lock();
        let tracker = &shared.tracker;
        let session = tracker.session();
        NavigationSnapshot {
            state: tracker.state(),
            loading: shared.loading,
            cursor: session.cursor,
            instruction: tracker.current_instruction().cloned(),
            distance_to_maneuver_end_meters: session.distance_to_maneuver_end_meters,
            remaining_after_current: tracker.remaining_after_current(),
            arrived: session.arrived,
            last_error: session.last_error.clone(),
        }
    }
}

impl<P, S> Drop for NavigationController<P, S> {
    fn drop(&mut self) {
        release(self.subscription.get_mut());
    }
}

fn release(slot: &mut Option<Box<dyn Subscription>>) {
    if let Some(mut subscription) = slot.take() {
        subscription.cancel();
        tracing::debug!("position subscription released");
    }
}

fn fix_callback(
    shared: Arc<Mutex<Shared>>,
    generation: u64,
    speech: SpeechGate,
) -> crate::traits::FixCallback {
    Box::new(move |event: FixEvent| {
        let announcement = {
            let mut shared = shared.lock();
            if shared.generation != generation {
                return;
            }

            match event {
                Ok(fix) => match shared.tracker.update(&fix) {
                    Some(TrackerEvent::Advanced { announcement, .. }) => announcement,
                    Some(TrackerEvent::Arrived) | None => None,
                },
                Err(err) => {
                    tracing::warn!(error = %err, "position fix failed, waiting for next");
                    shared.tracker.set_last_error(Some(err));
                    None
                }
            }
        };

        if let Some(Announcement { text, cursor }) = announcement {
            match speech.speak(&text) {
                Ok(outcome) => {
                    tracing::debug!(leg = cursor.leg, maneuver = cursor.maneuver, ?outcome, "announcement");
                }
                Err(NavError::SpeechUnsupported) => {}
                Err(err) => tracing::warn!(error = %err, "announcement failed"),
            }
        }
    })
}
