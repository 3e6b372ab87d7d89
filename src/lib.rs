//! A -> B -> C Reaction Simulator Library
//!
//! Fixed-step explicit Euler integration of the sequential first-order
//! reaction A -> B -> C, with optional non-negativity and mass-conservation
//! checks and the closed-form solutions used as ground truth.

pub mod commands;
pub mod config;
pub mod error;
pub mod kinetics;
pub mod output;
pub mod simulation;

pub use config::RunConfig;
pub use error::{Result, SimulationError};
pub use kinetics::{derivative, euler_step, Concentrations, KineticParams, Species};
pub use simulation::{simulate, ReactionSimulator, Trajectory, ValidationThresholds};
