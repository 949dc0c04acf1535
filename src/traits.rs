//! Seams to the collaborators around the navigation core.
//!
//! The core only consumes these: a routing service, a device position
//! stream and a speech output. Concrete apps implement them for their
//! platform.

use crate::error::NavError;
use crate::location::{Fix, FixEvent, LocationConfig};
use crate::route::Route;
use crate::valhalla::RouteRequest;

/// Computes a route between the request's locations.
pub trait RoutingProvider {
    fn route(&self, request: &RouteRequest) -> Result<Route, NavError>;
}

/// Callback receiving every fix (or fix error) pushed by a position source.
pub type FixCallback = Box<dyn FnMut(FixEvent) + Send + 'static>;

/// A live position subscription.
///
/// Dropping the handle must also release the underlying watcher.
pub trait Subscription: Send {
    /// Stops delivery. Calling it more than once is a no-op.
    fn cancel(&mut self);
}

/// Device location acquisition.
pub trait PositionSource {
    /// Reads a single fix, waiting at most `config.fix_timeout()`.
    fn current_fix(&self, config: &LocationConfig) -> Result<Fix, NavError>;

    /// Starts pushing fixes to `callback` until the returned handle is cancelled.
    fn subscribe(&self, callback: FixCallback) -> Result<Box<dyn Subscription>, NavError>;
}

/// Text-to-speech output.
pub trait SpeechSink: Send + Sync {
    /// Starts speaking `text`. The utterance counts as in flight until
    /// `done` is dropped.
    fn speak(&self, text: &str, done: crate::speech::Utterance);
}
