//! route-guide core
//!
//! Turn-by-turn guidance over a routing service: decodes the route shape,
//! tracks progress against live position fixes and decides when to
//! announce the next maneuver.

pub mod error;
pub mod geo;
pub mod polyline;
pub mod route;
pub mod traits;
pub mod valhalla;
pub mod location;
pub mod speech;
pub mod tracker;
pub mod session;
pub mod config;

pub use error::NavError;
