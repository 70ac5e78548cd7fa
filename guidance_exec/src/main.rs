//! Guidance executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Telecommand processing, from the script
//!         - Trajectory execution processing
//!         - Actuation command output
//!     - Save the final status report
//!
//! # Modules
//!
//! All modules (e.g. `traj_exec`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use comms_if::tc::guidance::GuidanceCmd;
use guidance_lib::{data_store::DataStore, traj_exec::TrajExecInput};

mod tc_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use serde::Deserialize;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use util::{
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Guidance trajectory executor
#[derive(Debug, StructOpt)]
#[structopt(name = "guidance_exec")]
struct Opts {
    /// Path to the TC script to execute
    #[structopt(parse(from_os_str))]
    script: PathBuf,

    /// Run cycles back to back instead of in real time
    #[structopt(long)]
    fast: bool,
}

/// Parameters for the executable itself
#[derive(Debug, Deserialize)]
struct ExecParams {
    /// Target period of one cycle
    cycle_period_s: f64,

    /// Completion thresholds at which trajectory progress is logged
    #[serde(default)]
    progress_thresholds: Vec<f64>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("guidance_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Guidance Trajectory Executor\n");
    info!("Running on: {}", host::get_platform());
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: ExecParams =
        util::params::load("guidance_exec.toml").wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    // ---- LOAD SCRIPT ----

    info!("Loading script from {:?}", opts.script);

    let mut si = ScriptInterpreter::new(&opts.script).wrap_err("Failed to load script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} TCs\n",
        si.get_duration(),
        si.get_num_tcs()
    );

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.traj_exec
        .init("traj_exec.toml")
        .wrap_err("Failed to initialise TrajExec")?;

    for &threshold in exec_params.progress_thresholds.iter() {
        ds.traj_exec
            .executor_mut()
            .register_progress_callback(threshold, move |fraction| {
                info!(
                    "Trajectory progress passed {:.0} % (at {:.1} %)",
                    threshold * 100.0,
                    fraction * 100.0
                )
            });
    }
    info!("TrajExec init complete");

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(exec_params.cycle_period_s);

        // ---- TELECOMMAND PROCESSING ----

        match si.get_pending_tcs(ds.sim_time_s) {
            PendingTcs::None => (),
            PendingTcs::Some(tc_vec) => {
                for tc in tc_vec.iter() {
                    tc_processor::exec(&mut ds, tc);
                }
            }
            // Exit if end of script reached
            PendingTcs::EndOfScript => {
                info!("End of TC script reached, stopping");
                break;
            }
        }

        // ---- TRAJECTORY EXECUTION ----

        // Update failures are logged by the module and carried in its report
        let (o, r) = ds
            .traj_exec
            .proc(&ds.traj_exec_input)
            .wrap_err("TrajExec processing failed")?;
        ds.traj_exec_output = o;
        ds.traj_exec_status_rpt = r;

        // ---- ACTUATION ----

        for cmd in ds.traj_exec_output.actuation_cmds.iter() {
            info!("Actuation command: {:?}", cmd);
        }

        if ds.is_1_hz_cycle {
            debug!(
                "t = {:.1} s, downtrack = {:.2} m, completion = {:.3}",
                ds.sim_time_s,
                ds.traj_exec_status_rpt.downtrack_m,
                ds.traj_exec_status_rpt.completion_fraction
            );
        }

        // ---- CYCLE MANAGEMENT ----

        if !opts.fast {
            let cycle_dur = Instant::now() - cycle_start_instant;

            // Get sleep duration
            match Duration::from_secs_f64(exec_params.cycle_period_s).checked_sub(cycle_dur) {
                Some(d) => {
                    ds.num_consec_cycle_overruns = 0;
                    thread::sleep(d);
                }
                None => {
                    warn!(
                        "Cycle overran by {:.06} s",
                        cycle_dur.as_secs_f64() - exec_params.cycle_period_s
                    );
                    ds.num_consec_cycle_overruns += 1;
                }
            }
        }

        ds.cycle_end();
    }

    // ---- SHUTDOWN ----

    let final_rpt = ds.traj_exec_status_rpt.clone();
    info!("Final status: {:?}", final_rpt);
    session.save("traj_exec/final_status.json", final_rpt);

    // Release any axes still held
    let shutdown_input = TrajExecInput {
        cmds: vec![GuidanceCmd::Abort],
        downtrack_m: None,
    };
    let (o, _) = ds
        .traj_exec
        .proc(&shutdown_input)
        .wrap_err("TrajExec shutdown failed")?;
    for cmd in o.actuation_cmds.iter() {
        info!("Actuation command: {:?}", cmd);
    }

    info!("End of execution");

    session.exit();

    Ok(())
}
