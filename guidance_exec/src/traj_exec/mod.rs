//! # Trajectory execution module
//!
//! Trajectory execution drives the vehicle through a planned trajectory using nothing but the
//! downtrack distance reported by the position feed.
//!
//! A trajectory covers an interval of the route and is made up of maneuvers. Each maneuver acts on
//! one axis, either lateral (steering) or longitudinal (speed), and covers its own sub-interval of
//! the trajectory. At most one maneuver is active on each axis at any time, and the two axes are
//! scheduled independently.
//!
//! On every position update the executor:
//!
//!  1. Starts the active maneuvers whose start location has been reached.
//!  1. Fires any progress callbacks whose completion threshold has been reached.
//!  1. Stops maneuvers whose end location has been reached and moves on to the maneuver which
//!     starts where the finished one ended, starting it in the same update so there is no gap in
//!     actuation.
//!  1. Once neither axis has a maneuver left, swaps in the queued trajectory (double buffering),
//!     or goes idle if nothing is queued.
//!
//! Maneuvers and trajectories are accessed only through the [`Maneuver`] and [`Trajectory`]
//! traits, [`PlannedTrajectory`] and the maneuvers in [`maneuvers`] being the implementations used
//! by the executable.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod axis;
pub mod callbacks;
pub mod executor;
pub mod maneuver;
pub mod maneuvers;
pub mod params;
pub mod state;
pub mod trajectory;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use axis::*;
pub use callbacks::*;
pub use executor::*;
pub use maneuver::*;
pub use params::*;
pub use state::*;
pub use trajectory::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during trajectory execution.
#[derive(Debug, thiserror::Error)]
pub enum TrajExecError {
    /// The trajectory starts and ends at the same location, so its completion cannot be
    /// calculated. This is a defect in the planner.
    #[error("Trajectory [{start_m}, {end_m}] m has zero length")]
    DegenerateTrajectory { start_m: f64, end_m: f64 },

    /// The position feed went backwards and the regression policy is set to reject.
    #[error("Downtrack distance regressed from {previous_m} m to {new_m} m")]
    DistanceRegression { previous_m: f64, new_m: f64 },

    /// The position feed reported a NaN or infinite distance.
    #[error("Downtrack distance {0} m is not finite")]
    NonFiniteDistance(f64),

    /// A maneuver could not be started or stopped. The axis has been made inactive.
    #[error("The {axis} maneuver failed: {source}")]
    Maneuver {
        axis: Axis,
        source: ManeuverError,
    },

    /// The trajectory handed out a handle it cannot resolve.
    #[error("The trajectory has no maneuver for {0:?}")]
    UnknownManeuver(ManeuverHandle),

    /// The trajectory's next maneuver on an axis does not end after the one it replaces, so the
    /// executor could never move past it.
    #[error("The trajectory's {0} maneuvers do not progress beyond {1} m")]
    NonProgressingManeuver(Axis, f64),

    /// A trajectory could not be built from its specification.
    #[error("Could not build the trajectory: {0}")]
    TrajectoryError(TrajectoryError),
}
