//! # Communications interface crate.
//!
//! Provides all common interface definitions shared between the guidance executable, its scripts
//! and the equipment it commands.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Telecommand definitions, including guidance commands and trajectory specifications
pub mod tc;

/// Command definitions for equipment (like the actuation sink)
pub mod eqpt;
