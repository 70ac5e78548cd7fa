//! # Actuation interface
//!
//! Commands emitted by guidance maneuvers towards the vehicle's actuation sink. Guidance never
//! closes the control loops itself, it only tells the lower level controllers which behaviour is
//! wanted on each axis.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt::Display;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The control axis a maneuver acts on.
///
/// Maneuvers on different axes are scheduled independently of one another.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Steering, i.e. motion across the road
    Lateral,

    /// Speed, i.e. motion along the road
    Longitudinal,
}

/// A command for the actuation sink.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActuationCmd {
    /// Hold the given speed.
    Speed {
        /// Target speed in meters/second.
        speed_mps: f64,

        /// Acceleration limit used to reach the target speed, in meters/second^2.
        ///
        /// Always positive, the limit applies to both acceleration and deceleration.
        max_accel_mps2: f64,
    },

    /// Keep the vehicle centred in its current lane.
    LaneFollow,

    /// Move into the given lane.
    ///
    /// Lanes are indexed from the rightmost lane (0) upwards.
    LaneChange { target_lane: i8 },

    /// Release control of the given axis, the lower level controller falls back to its own
    /// default behaviour.
    Release { axis: Axis },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Axis {
    /// Both axes, lateral first.
    pub const ALL: [Axis; 2] = [Axis::Lateral, Axis::Longitudinal];
}

impl Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Lateral => write!(f, "lateral"),
            Axis::Longitudinal => write!(f, "longitudinal"),
        }
    }
}

impl ActuationCmd {
    /// The axis this command acts on.
    pub fn axis(&self) -> Axis {
        match self {
            ActuationCmd::Speed { .. } => Axis::Longitudinal,
            ActuationCmd::LaneFollow | ActuationCmd::LaneChange { .. } => Axis::Lateral,
            ActuationCmd::Release { axis } => *axis,
        }
    }
}
