//! Maneuver implementations
//!
//! Each maneuver sends one [`ActuationCmd`] to the actuation sink when it starts and releases its
//! axis when it stops. The lower level controllers are responsible for actually achieving the
//! demand.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use std::sync::mpsc::Sender;

// Internal
use super::{Axis, Maneuver, ManeuverError};
use comms_if::{
    eqpt::actuation::ActuationCmd,
    tc::guidance::{ManeuverKind, ManeuverSpec},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Connection from a maneuver to the actuation sink, tracking whether the maneuver currently
/// holds its axis.
#[derive(Debug, Clone)]
struct ActuationLink {
    sink: Sender<ActuationCmd>,
    running: bool,
}

/// Hold a constant speed.
#[derive(Debug, Clone)]
pub struct SteadySpeed {
    start_m: f64,
    end_m: f64,
    speed_mps: f64,
    max_accel_mps2: f64,
    link: ActuationLink,
}

/// Stay centred in the current lane.
#[derive(Debug, Clone)]
pub struct LaneFollow {
    start_m: f64,
    end_m: f64,
    link: ActuationLink,
}

/// Move into another lane.
#[derive(Debug, Clone)]
pub struct LaneChange {
    start_m: f64,
    end_m: f64,
    target_lane: i8,
    link: ActuationLink,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the maneuver described by `spec`, sending its commands into `sink`.
pub fn from_spec(spec: &ManeuverSpec, sink: &Sender<ActuationCmd>) -> Box<dyn Maneuver> {
    match spec.kind {
        ManeuverKind::SteadySpeed {
            speed_mps,
            max_accel_mps2,
        } => Box::new(SteadySpeed::new(
            spec.start_m,
            spec.end_m,
            speed_mps,
            max_accel_mps2,
            sink.clone(),
        )),
        ManeuverKind::LaneFollow => {
            Box::new(LaneFollow::new(spec.start_m, spec.end_m, sink.clone()))
        }
        ManeuverKind::LaneChange { target_lane } => Box::new(LaneChange::new(
            spec.start_m,
            spec.end_m,
            target_lane,
            sink.clone(),
        )),
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ActuationLink {
    fn new(sink: Sender<ActuationCmd>) -> Self {
        Self {
            sink,
            running: false,
        }
    }

    /// Send the command which takes control of the axis.
    fn engage(&mut self, cmd: ActuationCmd) -> Result<(), ManeuverError> {
        trace!("Engaging {}: {:?}", cmd.axis(), cmd);

        self.sink
            .send(cmd)
            .map_err(|_| ManeuverError::SinkDisconnected(cmd.axis()))?;
        self.running = true;

        Ok(())
    }

    /// Hand the axis back. A no-op if the axis isn't held.
    ///
    /// The link is marked as not running even if the release can't be delivered.
    fn release(&mut self, axis: Axis) -> Result<(), ManeuverError> {
        if !self.running {
            return Ok(());
        }
        self.running = false;

        self.sink
            .send(ActuationCmd::Release { axis })
            .map_err(|_| ManeuverError::SinkDisconnected(axis))
    }
}

impl SteadySpeed {
    pub fn new(
        start_m: f64,
        end_m: f64,
        speed_mps: f64,
        max_accel_mps2: f64,
        sink: Sender<ActuationCmd>,
    ) -> Self {
        Self {
            start_m,
            end_m,
            speed_mps,
            max_accel_mps2,
            link: ActuationLink::new(sink),
        }
    }

    /// The speed this maneuver holds, in meters/second.
    pub fn speed_mps(&self) -> f64 {
        self.speed_mps
    }
}

impl Maneuver for SteadySpeed {
    fn axis(&self) -> Axis {
        Axis::Longitudinal
    }

    fn start_location(&self) -> f64 {
        self.start_m
    }

    fn end_location(&self) -> f64 {
        self.end_m
    }

    fn is_running(&self) -> bool {
        self.link.running
    }

    fn start(&mut self) -> Result<(), ManeuverError> {
        if self.speed_mps < 0.0 || self.max_accel_mps2 <= 0.0 {
            return Err(ManeuverError::Rejected(format!(
                "speed {} m/s with acceleration limit {} m/s^2 is not achievable",
                self.speed_mps, self.max_accel_mps2
            )));
        }

        self.link.engage(ActuationCmd::Speed {
            speed_mps: self.speed_mps,
            max_accel_mps2: self.max_accel_mps2,
        })
    }

    fn stop(&mut self) -> Result<(), ManeuverError> {
        self.link.release(Axis::Longitudinal)
    }
}

impl LaneFollow {
    pub fn new(start_m: f64, end_m: f64, sink: Sender<ActuationCmd>) -> Self {
        Self {
            start_m,
            end_m,
            link: ActuationLink::new(sink),
        }
    }
}

impl Maneuver for LaneFollow {
    fn axis(&self) -> Axis {
        Axis::Lateral
    }

    fn start_location(&self) -> f64 {
        self.start_m
    }

    fn end_location(&self) -> f64 {
        self.end_m
    }

    fn is_running(&self) -> bool {
        self.link.running
    }

    fn start(&mut self) -> Result<(), ManeuverError> {
        self.link.engage(ActuationCmd::LaneFollow)
    }

    fn stop(&mut self) -> Result<(), ManeuverError> {
        self.link.release(Axis::Lateral)
    }
}

impl LaneChange {
    pub fn new(start_m: f64, end_m: f64, target_lane: i8, sink: Sender<ActuationCmd>) -> Self {
        Self {
            start_m,
            end_m,
            target_lane,
            link: ActuationLink::new(sink),
        }
    }

    /// The lane this maneuver moves into.
    pub fn target_lane(&self) -> i8 {
        self.target_lane
    }
}

impl Maneuver for LaneChange {
    fn axis(&self) -> Axis {
        Axis::Lateral
    }

    fn start_location(&self) -> f64 {
        self.start_m
    }

    fn end_location(&self) -> f64 {
        self.end_m
    }

    fn is_running(&self) -> bool {
        self.link.running
    }

    fn start(&mut self) -> Result<(), ManeuverError> {
        if self.target_lane < 0 {
            return Err(ManeuverError::Rejected(format!(
                "lane {} does not exist",
                self.target_lane
            )));
        }

        self.link.engage(ActuationCmd::LaneChange {
            target_lane: self.target_lane,
        })
    }

    fn stop(&mut self) -> Result<(), ManeuverError> {
        self.link.release(Axis::Lateral)
    }
}
