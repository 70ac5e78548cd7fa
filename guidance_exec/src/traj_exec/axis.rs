//! Per-axis storage

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::ops::{Index, IndexMut};

pub use comms_if::eqpt::actuation::Axis;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One value for each control axis.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct PerAxis<T> {
    pub lateral: T,
    pub longitudinal: T,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T> PerAxis<T> {
    /// Build from a function of the axis.
    pub fn from_fn<F: FnMut(Axis) -> T>(mut f: F) -> Self {
        Self {
            lateral: f(Axis::Lateral),
            longitudinal: f(Axis::Longitudinal),
        }
    }
}

impl<T> Index<Axis> for PerAxis<T> {
    type Output = T;

    fn index(&self, axis: Axis) -> &T {
        match axis {
            Axis::Lateral => &self.lateral,
            Axis::Longitudinal => &self.longitudinal,
        }
    }
}

impl<T> IndexMut<Axis> for PerAxis<T> {
    fn index_mut(&mut self, axis: Axis) -> &mut T {
        match axis {
            Axis::Lateral => &mut self.lateral,
            Axis::Longitudinal => &mut self.longitudinal,
        }
    }
}
