//! # Data Store

use crate::traj_exec::{TrajExecInput, TrajExecModule, TrajExecOutput, TrajExecStatusReport};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Simulation elapsed time, advanced by one cycle period each cycle
    pub sim_time_s: f64,

    // TrajExec
    pub traj_exec: TrajExecModule,
    pub traj_exec_input: TrajExecInput,
    pub traj_exec_output: TrajExecOutput,
    pub traj_exec_status_rpt: TrajExecStatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets the 1Hz cycle flag.
    /// The status report is kept so that the last one is always available.
    pub fn cycle_start(&mut self, cycle_period_s: f64) {
        let cycles_per_second = ((1.0 / cycle_period_s).round() as u128).max(1);

        self.is_1_hz_cycle = self.num_cycles % cycles_per_second == 0;

        self.traj_exec_input = TrajExecInput::default();
        self.traj_exec_output = TrajExecOutput::default();

        self.sim_time_s = self.num_cycles as f64 * cycle_period_s;
    }

    /// Perform actions required at the end of a cycle.
    pub fn cycle_end(&mut self) {
        self.num_cycles += 1;
    }
}
