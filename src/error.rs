//! Error types for the A -> B -> C simulator.

use thiserror::Error;

use crate::kinetics::Species;

/// Everything that can abort a simulation run or one of the commands around it.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// A concentration fell below `-tol_neg` during a checked run.
    #[error(
        "invalid state at step {step} (t = {time:.6} s): {species} = {value:e} is below -tol_neg ({tol_neg:e})"
    )]
    InvalidState {
        step: usize,
        time: f64,
        species: Species,
        value: f64,
        tol_neg: f64,
    },

    /// Total mass A+B+C drifted from its initial value by more than `tol_mass`.
    #[error(
        "mass conservation violated at step {step} (t = {time:.6} s): drift {drift:e} exceeds tol_mass ({tol_mass:e})"
    )]
    MassDrift {
        step: usize,
        time: f64,
        drift: f64,
        tol_mass: f64,
    },

    /// Bad arguments (non-positive step, negative duration, ...)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl SimulationError {
    /// True for the two numerical-check failures, as opposed to bad input or I/O.
    pub fn is_check_failure(&self) -> bool {
        matches!(self, Self::InvalidState { .. } | Self::MassDrift { .. })
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;
