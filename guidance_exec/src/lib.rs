//! # Guidance library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access items defined
//! inside the guidance crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Data store - all data shared between modules during a cycle of the executable
pub mod data_store;

/// Trajectory execution module - schedules maneuvers from downtrack position feedback
pub mod traj_exec;
