//! Trajectory contract and the planned trajectory implementation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::fmt::Debug;
use std::sync::mpsc::Sender;

// Internal
use super::{maneuvers, Axis, Maneuver, PerAxis};
use comms_if::{eqpt::actuation::ActuationCmd, tc::guidance::TrajectorySpec};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// An ordered plan of per-axis maneuvers spanning a downtrack interval.
///
/// The trajectory owns its maneuvers and hands out [`ManeuverHandle`]s to refer to them. All
/// queries must be pure: the same arguments always give the same handle for a given trajectory.
pub trait Trajectory: Debug {
    /// Downtrack location at which the trajectory begins, in meters.
    fn start_location(&self) -> f64;

    /// Downtrack location at which the trajectory ends, in meters.
    fn end_location(&self) -> f64;

    /// The maneuver on `axis` whose `[start, end)` interval contains `location`.
    fn maneuver_covering(&self, location: f64, axis: Axis) -> Option<ManeuverHandle>;

    /// The earliest maneuver on `axis` which starts at or after `location`.
    fn next_maneuver_after(&self, location: f64, axis: Axis) -> Option<ManeuverHandle>;

    /// Resolve a handle previously returned by this trajectory.
    fn maneuver(&self, handle: ManeuverHandle) -> Option<&dyn Maneuver>;

    /// Resolve a handle previously returned by this trajectory for mutation.
    fn maneuver_mut(&mut self, handle: ManeuverHandle) -> Option<&mut dyn Maneuver>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Non-owning reference to a maneuver within a trajectory.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ManeuverHandle {
    axis: Axis,
    index: usize,
}

/// A trajectory assembled from individual maneuvers, usually from a planner's
/// [`TrajectorySpec`].
///
/// Maneuvers on each axis are kept sorted by start location and never overlap.
#[derive(Debug)]
pub struct PlannedTrajectory {
    start_m: f64,
    end_m: f64,
    maneuvers: PerAxis<Vec<Box<dyn Maneuver>>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which occur while assembling a trajectory.
#[derive(Debug, thiserror::Error)]
pub enum TrajectoryError {
    #[error("Trajectory bounds [{0}, {1}] m are invalid")]
    InvalidBounds(f64, f64),

    #[error("Maneuver interval [{0}, {1}] m ends before it starts")]
    InvalidInterval(f64, f64),

    #[error("Maneuver interval [{0}, {1}] m lies outside the trajectory [{2}, {3}] m")]
    OutOfBounds(f64, f64, f64, f64),

    #[error("Maneuver interval [{0}, {1}] m overlaps another {2} maneuver")]
    Overlap(f64, f64, Axis),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ManeuverHandle {
    pub fn new(axis: Axis, index: usize) -> Self {
        Self { axis, index }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl PlannedTrajectory {
    /// Create an empty trajectory over `[start_m, end_m]`.
    ///
    /// A zero length trajectory is accepted here, the executor refuses to run it.
    pub fn new(start_m: f64, end_m: f64) -> Result<Self, TrajectoryError> {
        if !start_m.is_finite() || !end_m.is_finite() || end_m < start_m {
            return Err(TrajectoryError::InvalidBounds(start_m, end_m));
        }

        Ok(Self {
            start_m,
            end_m,
            maneuvers: PerAxis::default(),
        })
    }

    /// Build a trajectory from a planner's specification, connecting every maneuver to `sink`.
    pub fn from_spec(
        spec: &TrajectorySpec,
        sink: &Sender<ActuationCmd>,
    ) -> Result<Self, TrajectoryError> {
        let mut traj = Self::new(spec.start_m, spec.end_m)?;

        for mnvr_spec in spec.maneuvers.iter() {
            traj.add_maneuver(maneuvers::from_spec(mnvr_spec, sink))?;
        }

        Ok(traj)
    }

    /// Add a maneuver to the trajectory.
    ///
    /// The maneuver must lie within the trajectory and must not overlap any other maneuver on
    /// the same axis. Maneuvers may be added in any order.
    pub fn add_maneuver(&mut self, maneuver: Box<dyn Maneuver>) -> Result<(), TrajectoryError> {
        let start_m = maneuver.start_location();
        let end_m = maneuver.end_location();
        let axis = maneuver.axis();

        if !(start_m <= end_m) {
            return Err(TrajectoryError::InvalidInterval(start_m, end_m));
        }

        if start_m < self.start_m || end_m > self.end_m {
            return Err(TrajectoryError::OutOfBounds(
                start_m, end_m, self.start_m, self.end_m,
            ));
        }

        let list = &mut self.maneuvers[axis];

        if list
            .iter()
            .any(|m| m.start_location() < end_m && start_m < m.end_location())
        {
            return Err(TrajectoryError::Overlap(start_m, end_m, axis));
        }

        // Keep the list sorted by start location
        let pos = list
            .iter()
            .position(|m| m.start_location() > start_m)
            .unwrap_or(list.len());
        list.insert(pos, maneuver);

        Ok(())
    }

    /// The maneuvers on `axis` in downtrack order.
    pub fn maneuvers(&self, axis: Axis) -> &[Box<dyn Maneuver>] {
        &self.maneuvers[axis]
    }

    /// Number of maneuvers on both axes.
    pub fn num_maneuvers(&self) -> usize {
        self.maneuvers.lateral.len() + self.maneuvers.longitudinal.len()
    }
}

impl Trajectory for PlannedTrajectory {
    fn start_location(&self) -> f64 {
        self.start_m
    }

    fn end_location(&self) -> f64 {
        self.end_m
    }

    fn maneuver_covering(&self, location: f64, axis: Axis) -> Option<ManeuverHandle> {
        self.maneuvers[axis]
            .iter()
            .position(|m| m.covers(location))
            .map(|i| ManeuverHandle::new(axis, i))
    }

    fn next_maneuver_after(&self, location: f64, axis: Axis) -> Option<ManeuverHandle> {
        self.maneuvers[axis]
            .iter()
            .position(|m| m.start_location() >= location)
            .map(|i| ManeuverHandle::new(axis, i))
    }

    fn maneuver(&self, handle: ManeuverHandle) -> Option<&dyn Maneuver> {
        let maneuver: &dyn Maneuver = self.maneuvers[handle.axis].get(handle.index)?.as_ref();
        Some(maneuver)
    }

    fn maneuver_mut(&mut self, handle: ManeuverHandle) -> Option<&mut dyn Maneuver> {
        let maneuver: &mut dyn Maneuver = self.maneuvers[handle.axis]
            .get_mut(handle.index)?
            .as_mut();
        Some(maneuver)
    }
}
