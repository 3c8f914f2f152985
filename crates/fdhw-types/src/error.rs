// ─────────────────────────────────────────────────────────────────────
// FDHW Kernel — Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all kernel failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FdhwError {
    /// Invalid grid, buffer geometry, physics or time parameters.
    /// Detected at setup and never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A derivative contained NaN or Inf. The integrator owns recovery.
    #[error("numerical instability at t={t}: non-finite value {value} at index {index}")]
    NumericalInstability { t: f64, index: usize, value: f64 },

    /// Mode or sample count mismatch between a transform and its grid.
    /// Indicates a programming defect.
    #[error("transform consistency error in {context}: expected {expected} entries, found {found}")]
    TransformConsistency {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    /// Flat state buffer does not match the grid's layout.
    #[error("state layout error: expected {expected} reals, found {found}")]
    StateLayout { expected: usize, found: usize },
}

impl FdhwError {
    /// Shorthand for a `Configuration` error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

pub type FdhwResult<T> = Result<T, FdhwError>;
