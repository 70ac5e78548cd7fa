//! Trajectory execution parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for trajectory execution
#[derive(Deserialize, Debug, Clone, Default)]
pub struct TrajExecParams {
    /// What to do when the downtrack distance goes backwards.
    #[serde(default)]
    pub regression_policy: RegressionPolicy,

    /// Regressions no larger than this are position noise and are accepted without comment,
    /// whatever the policy.
    ///
    /// Units: meters
    #[serde(default)]
    pub regression_tolerance_m: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Handling of a downtrack distance which is less than the previous one.
///
/// Maneuvers which have already been started are never un-started, whatever the policy.
///
/// The distance a regression is measured from is forgotten when a trajectory is aborted, so a
/// vehicle re-localised onto a new route is not held to its old position. Non-finite distances
/// never become that reference, they are rejected before any policy applies.
#[derive(Deserialize, Debug, Copy, Clone, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RegressionPolicy {
    /// Use the new distance and log a warning.
    Accept,

    /// Keep the previous distance, treating the update as a repeat of the last one.
    Hold,

    /// Reject the update with an error, leaving the executor untouched.
    Reject,
}

impl Default for RegressionPolicy {
    fn default() -> Self {
        RegressionPolicy::Accept
    }
}
