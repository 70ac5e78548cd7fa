//! # Telecommand processor module
//!
//! The telecommand processor handles TCs coming from any source.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};

// Internal
use comms_if::tc::Tc;
use guidance_lib::data_store::DataStore;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Mutates the datastore to send commands to different modules.
pub(crate) fn exec(ds: &mut DataStore, tc: &Tc) {
    match tc {
        Tc::Heartbeat => trace!("Recieved Heartbeat"),
        Tc::Position(p) => {
            // Only the latest position in a cycle is used
            ds.traj_exec_input.downtrack_m = Some(p.downtrack_m);
        }
        Tc::Guidance(cmd) => {
            debug!("Recieved guidance command: {:?}", cmd);
            ds.traj_exec_input.cmds.push(cmd.clone());
        }
    }
}
