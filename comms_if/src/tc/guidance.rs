//! # Guidance Telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A serialisable description of a planned trajectory.
///
/// The planner builds these, guidance turns them into executable trajectories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySpec {
    /// Downtrack location at which the trajectory begins, in meters.
    pub start_m: f64,

    /// Downtrack location at which the trajectory ends, in meters.
    pub end_m: f64,

    /// The maneuvers making up the trajectory, in any order and for either axis.
    #[serde(default)]
    pub maneuvers: Vec<ManeuverSpec>,
}

/// A single maneuver within a [`TrajectorySpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManeuverSpec {
    /// Downtrack location at which the maneuver begins, in meters.
    pub start_m: f64,

    /// Downtrack location at which the maneuver ends, in meters.
    pub end_m: f64,

    /// What the maneuver does.
    pub kind: ManeuverKind,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command that can be performed by the guidance system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GuidanceCmd {
    /// Execute the given trajectory. If one is already executing it will be queued to run once
    /// the current one is complete.
    Submit(TrajectorySpec),

    /// Abort the executing and queued trajectories.
    Abort,
}

/// The kinds of maneuver guidance knows how to execute.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum ManeuverKind {
    /// Hold a constant speed.
    SteadySpeed {
        /// Speed to hold in meters/second.
        speed_mps: f64,

        /// Acceleration limit in meters/second^2.
        max_accel_mps2: f64,
    },

    /// Stay centred in the current lane.
    LaneFollow,

    /// Change into the given lane.
    LaneChange { target_lane: i8 },
}
