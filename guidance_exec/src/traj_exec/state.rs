//! Trajectory execution module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::mpsc::{channel, Receiver, Sender};

// Internal
use super::*;
use comms_if::{eqpt::actuation::ActuationCmd, tc::guidance::GuidanceCmd};
use util::{module::State, params};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Cyclic wrapper around the [`TrajExecutor`].
///
/// Owns the actuation channel the module's maneuvers send into, so that each cycle's actuation
/// commands can be returned as the module's output.
pub struct TrajExecModule {
    executor: TrajExecutor,

    actuation_tx: Sender<ActuationCmd>,
    actuation_rx: Receiver<ActuationCmd>,

    /// Number of submitted trajectories which could not be executed
    num_rejected_trajectories: u64,

    /// Number of position updates which returned an error
    num_update_errors: u64,

    /// Error from this cycle's position update, if it failed
    update_error: Option<String>,
}

/// Input data to the module
#[derive(Debug, Default, Clone)]
pub struct TrajExecInput {
    /// Guidance commands received this cycle, processed in order before the position update.
    pub cmds: Vec<GuidanceCmd>,

    /// Downtrack distance reported this cycle, if any.
    pub downtrack_m: Option<f64>,
}

/// Output data from the module
#[derive(Debug, Default, Clone, Serialize)]
pub struct TrajExecOutput {
    /// Commands sent by the maneuvers during this cycle, in the order they were sent.
    pub actuation_cmds: Vec<ActuationCmd>,
}

/// Status report for trajectory execution.
#[derive(Debug, Default, Clone, Serialize)]
pub struct TrajExecStatusReport {
    /// True if no trajectory is executing
    pub idle: bool,

    /// True if a trajectory is waiting to follow the current one
    pub queued: bool,

    pub downtrack_m: f64,

    /// Completion fraction of the current trajectory, NaN if it can't be calculated
    pub completion_fraction: f64,

    pub lateral: Option<ManeuverReport>,
    pub longitudinal: Option<ManeuverReport>,

    /// Total number of submitted trajectories which could not be executed
    pub num_rejected_trajectories: u64,

    /// The error raised by this cycle's position update, if any
    pub update_error: Option<String>,

    /// Total number of position updates which raised an error
    pub num_update_errors: u64,
}

/// Summary of the maneuver assigned to an axis.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ManeuverReport {
    pub start_m: f64,
    pub end_m: f64,
    pub running: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for TrajExecModule {
    fn default() -> Self {
        Self::with_params(TrajExecParams::default())
    }
}

impl State for TrajExecModule {
    type InitData = &'static str;
    type InitError = params::LoadError;

    type InputData = TrajExecInput;
    type OutputData = TrajExecOutput;
    type StatusReport = TrajExecStatusReport;
    type ProcError = Infallible;

    /// Initialise the module.
    ///
    /// Expected init data is the path to the parameter file, relative to the params directory.
    /// Any trajectory or progress callback held by the module is discarded.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        let params: TrajExecParams = params::load(init_data)?;

        self.executor = TrajExecutor::new(params);

        Ok(())
    }

    /// Process trajectory execution.
    ///
    /// Processing involves:
    ///  1. Executing the cycle's guidance commands. Trajectories which can't be built or are
    ///     rejected by the executor are logged and counted rather than failing the cycle.
    ///  1. Updating the executor with the cycle's downtrack distance, if there is one.
    ///  1. Collecting the actuation commands sent by the maneuvers.
    ///
    /// A failed update still leaves the other axis processed, so its error is put in the status
    /// report and the commands sent during the update are output in the same cycle.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        for cmd in input_data.cmds.iter() {
            self.exec_cmd(cmd);
        }

        self.update_error = None;

        if let Some(d) = input_data.downtrack_m {
            if let Err(e) = self.executor.update_position(d) {
                warn!("Position update to {} m failed: {}", d, e);
                self.num_update_errors += 1;
                self.update_error = Some(e.to_string());
            }
        }

        let output = TrajExecOutput {
            actuation_cmds: self.actuation_rx.try_iter().collect(),
        };

        Ok((output, self.status_report()))
    }
}

impl TrajExecModule {
    /// Create the module with the given parameters rather than loading them from file.
    pub fn with_params(params: TrajExecParams) -> Self {
        let (actuation_tx, actuation_rx) = channel();

        Self {
            executor: TrajExecutor::new(params),
            actuation_tx,
            actuation_rx,
            num_rejected_trajectories: 0,
            num_update_errors: 0,
            update_error: None,
        }
    }

    pub fn executor(&self) -> &TrajExecutor {
        &self.executor
    }

    /// Mutable access to the executor, used to register progress callbacks.
    pub fn executor_mut(&mut self) -> &mut TrajExecutor {
        &mut self.executor
    }

    /// Build a report on the current state of execution.
    pub fn status_report(&self) -> TrajExecStatusReport {
        let maneuver_report = |axis: Axis| {
            self.executor
                .current_maneuver(axis)
                .map(|m| ManeuverReport {
                    start_m: m.start_location(),
                    end_m: m.end_location(),
                    running: m.is_running(),
                })
        };

        TrajExecStatusReport {
            idle: self.executor.is_idle(),
            queued: self.executor.has_queued_trajectory(),
            downtrack_m: self.executor.downtrack_distance(),
            completion_fraction: self.executor.completion_fraction().unwrap_or(f64::NAN),
            lateral: maneuver_report(Axis::Lateral),
            longitudinal: maneuver_report(Axis::Longitudinal),
            num_rejected_trajectories: self.num_rejected_trajectories,
            update_error: self.update_error.clone(),
            num_update_errors: self.num_update_errors,
        }
    }

    fn exec_cmd(&mut self, cmd: &GuidanceCmd) {
        match cmd {
            GuidanceCmd::Submit(spec) => {
                let result = PlannedTrajectory::from_spec(spec, &self.actuation_tx)
                    .map_err(TrajExecError::TrajectoryError)
                    .and_then(|traj| self.executor.submit(Box::new(traj)));

                if let Err(e) = result {
                    warn!("Rejected trajectory [{}, {}] m: {}", spec.start_m, spec.end_m, e);
                    self.num_rejected_trajectories += 1;
                }
            }
            GuidanceCmd::Abort => self.executor.abort(),
        }
    }
}
