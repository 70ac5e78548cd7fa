//! Maneuver contract

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::fmt::Debug;

use super::Axis;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A bounded, executable control action over a downtrack interval on one axis.
///
/// Maneuvers are owned by the trajectory that contains them. The executor only ever accesses them
/// through this trait, so new kinds of maneuver can be added without touching it.
pub trait Maneuver: Debug {
    /// The axis this maneuver acts on.
    fn axis(&self) -> Axis;

    /// Downtrack location at which the maneuver begins, in meters.
    fn start_location(&self) -> f64;

    /// Downtrack location at which the maneuver ends, in meters. Never less than the start.
    fn end_location(&self) -> f64;

    /// True between a successful `start` and the following `stop`.
    fn is_running(&self) -> bool;

    /// Begin executing the maneuver.
    ///
    /// The executor only calls this when the maneuver is not running.
    fn start(&mut self) -> Result<(), ManeuverError>;

    /// Stop executing the maneuver.
    ///
    /// Implementations must tolerate being stopped when they are not running, which happens
    /// during an abort.
    fn stop(&mut self) -> Result<(), ManeuverError>;

    /// True if `location` lies within `[start, end)`.
    fn covers(&self, location: f64) -> bool {
        self.start_location() <= location && location < self.end_location()
    }
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors a maneuver can report when starting or stopping.
#[derive(Debug, thiserror::Error)]
pub enum ManeuverError {
    /// The actuation sink has gone away so the command could not be delivered.
    #[error("The actuation sink for the {0} axis is disconnected")]
    SinkDisconnected(Axis),

    /// The maneuver refused the request.
    #[error("The maneuver rejected the request: {0}")]
    Rejected(String),
}
