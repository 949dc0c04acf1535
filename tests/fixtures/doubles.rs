//! In-process stand-ins for the routing service, GPS and speech output.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};

use parking_lot::Mutex;

use route_guide::error::NavError;
use route_guide::location::{Fix, FixEvent, LocationConfig};
use route_guide::route::Route;
use route_guide::speech::Utterance;
use route_guide::traits::{FixCallback, PositionSource, RoutingProvider, SpeechSink, Subscription};
use route_guide::valhalla::RouteRequest;

// ============================================================================
// Routing provider
// ============================================================================

struct Step {
    response: Result<Route, NavError>,
    /// Signalled on entry, then waited on before responding.
    gate: Option<(Sender<()>, Receiver<()>)>,
}

/// Answers route requests from a script, in order. Clones share the script.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    steps: Arc<Mutex<VecDeque<Step>>>,
    requests: Arc<Mutex<Vec<RouteRequest>>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, response: Result<Route, NavError>) -> Self {
        self.steps.lock().push_back(Step {
            response,
            gate: None,
        });
        self
    }

    /// Responds only after `release` fires; signals `entered` first.
    pub fn respond_when(
        self,
        response: Result<Route, NavError>,
        entered: Sender<()>,
        release: Receiver<()>,
    ) -> Self {
        self.steps.lock().push_back(Step {
            response,
            gate: Some((entered, release)),
        });
        self
    }

    pub fn requests(&self) -> Vec<RouteRequest> {
        self.requests.lock().clone()
    }
}

impl RoutingProvider for ScriptedProvider {
    fn route(&self, request: &RouteRequest) -> Result<Route, NavError> {
        self.requests.lock().push(request.clone());
        let step = self
            .steps
            .lock()
            .pop_front()
            .ok_or_else(|| NavError::transport("script exhausted"))?;

        if let Some((entered, release)) = step.gate {
            let _ = entered.send(());
            let _ = release.recv();
        }
        step.response
    }
}

// ============================================================================
// Position source
// ============================================================================

struct Subscriber {
    active: Arc<AtomicBool>,
    callback: Arc<Mutex<FixCallback>>,
}

#[derive(Default)]
struct ManualInner {
    subscribers: Vec<Subscriber>,
    current: Option<FixEvent>,
    fail_subscribe: Option<NavError>,
}

/// Position source driven by the test. Remembers cancelled callbacks so
/// late deliveries can be simulated.
#[derive(Clone, Default)]
pub struct ManualPositions {
    inner: Arc<Mutex<ManualInner>>,
}

impl ManualPositions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_current(&self, event: FixEvent) {
        self.inner.lock().current = Some(event);
    }

    pub fn fail_subscribe(&self, err: NavError) {
        self.inner.lock().fail_subscribe = Some(err);
    }

    pub fn active_count(&self) -> usize {
        self.inner
            .lock()
            .subscribers
            .iter()
            .filter(|s| s.active.load(Ordering::SeqCst))
            .count()
    }

    pub fn total_subscriptions(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    /// Delivers to live subscriptions only.
    pub fn push(&self, event: FixEvent) {
        for callback in self.callbacks(true) {
            let mut callback = callback.lock();
            (&mut **callback)(event.clone());
        }
    }

    pub fn push_fix(&self, (lat, lon): (f64, f64)) {
        self.push(Ok(Fix::new(lat, lon)));
    }

    /// Delivers to cancelled subscriptions only, like a watcher that fires
    /// once more after being cleared.
    pub fn push_late(&self, event: FixEvent) {
        for callback in self.callbacks(false) {
            let mut callback = callback.lock();
            (&mut **callback)(event.clone());
        }
    }

    fn callbacks(&self, active: bool) -> Vec<Arc<Mutex<FixCallback>>> {
        self.inner
            .lock()
            .subscribers
            .iter()
            .filter(|s| s.active.load(Ordering::SeqCst) == active)
            .map(|s| Arc::clone(&s.callback))
            .collect()
    }
}

pub struct ManualSubscription {
    active: Arc<AtomicBool>,
}

impl Subscription for ManualSubscription {
    fn cancel(&mut self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

impl Drop for ManualSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl PositionSource for ManualPositions {
    fn current_fix(&self, _config: &LocationConfig) -> Result<Fix, NavError> {
        self.inner
            .lock()
            .current
            .clone()
            .unwrap_or_else(|| Err(NavError::LocationUnavailable("no fix yet".to_string())))
    }

    fn subscribe(&self, callback: FixCallback) -> Result<Box<dyn Subscription>, NavError> {
        let mut inner = self.inner.lock();
        if let Some(err) = inner.fail_subscribe.take() {
            return Err(err);
        }
        let active = Arc::new(AtomicBool::new(true));
        inner.subscribers.push(Subscriber {
            active: Arc::clone(&active),
            callback: Arc::new(Mutex::new(callback)),
        });
        Ok(Box::new(ManualSubscription { active }))
    }
}

// ============================================================================
// Speech
// ============================================================================

/// Records every utterance it is handed.
#[derive(Default)]
pub struct RecordingSpeech {
    spoken: Mutex<Vec<String>>,
    /// When set, utterances stay in flight until `finish_all`.
    hold: AtomicBool,
    pending: Mutex<Vec<Utterance>>,
}

impl RecordingSpeech {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn holding() -> Arc<Self> {
        let speech = Self::default();
        speech.hold.store(true, Ordering::SeqCst);
        Arc::new(speech)
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }

    pub fn finish_all(&self) {
        self.pending.lock().clear();
    }
}

impl SpeechSink for RecordingSpeech {
    fn speak(&self, text: &str, done: Utterance) {
        self.spoken.lock().push(text.to_string());
        if self.hold.load(Ordering::SeqCst) {
            self.pending.lock().push(done);
        }
    }
}
