//! Commands exposed by the command-line front end
//!
//! Each command takes a run configuration and returns a serializable response.

use serde::Serialize;

use crate::config::RunConfig;
use crate::error::Result;
use crate::kinetics::Concentrations;
use crate::simulation::{self, AnalyticComparison, Trajectory};

/// Short description of a finished run
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunSummary {
    pub steps: usize,
    pub final_time: f64,
    pub final_state: Option<Concentrations>,
    pub initial_mass: f64,
    pub max_mass_drift: f64,
    pub min_concentration: f64,
}

impl RunSummary {
    pub fn from_trajectory(trajectory: &Trajectory) -> Self {
        Self {
            steps: trajectory.len().saturating_sub(1),
            final_time: trajectory.final_time(),
            final_state: trajectory.final_state(),
            initial_mass: trajectory.initial_state().map_or(0.0, |s| s.total()),
            max_mass_drift: trajectory.max_mass_drift(),
            min_concentration: trajectory.min_concentration(),
        }
    }
}

/// Response for the `simulate` and `analytic` commands
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResponse {
    pub config: RunConfig,
    pub summary: RunSummary,
    pub trajectory: Trajectory,
}

/// Response for the `compare` command
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResponse {
    pub config: RunConfig,
    pub summary: RunSummary,
    pub comparison: AnalyticComparison,
}

/// Integrate the configured run with explicit Euler
pub fn run_simulation(config: &RunConfig) -> Result<SimulationResponse> {
    log::info!(
        "Simulating A->B->C: k1={} k2={} t_end={} dt={} checks={}",
        config.kinetics.k1,
        config.kinetics.k2,
        config.t_end,
        config.dt,
        config.checks
    );

    let trajectory = config
        .simulator()
        .run(config.initial, config.t_end, config.dt)
        .map_err(|e| {
            log::warn!("Simulation aborted: {}", e);
            e
        })?;

    let summary = RunSummary::from_trajectory(&trajectory);
    log::debug!(
        "Finished {} steps, max mass drift {:e}",
        summary.steps,
        summary.max_mass_drift
    );

    Ok(SimulationResponse {
        config: config.clone(),
        summary,
        trajectory,
    })
}

/// Closed-form solution on the grid the simulator would use
///
/// Starts from the configured A0; B0 and C0 are taken as zero.
pub fn analytic_profile(config: &RunConfig) -> Result<SimulationResponse> {
    if config.initial.b != 0.0 || config.initial.c != 0.0 {
        log::warn!(
            "Analytic profile ignores B0 = {} and C0 = {}",
            config.initial.b,
            config.initial.c
        );
    }
    if config.kinetics.k1 == config.kinetics.k2 {
        log::warn!("k1 == k2: analytic B and C are undefined for equal rates");
    }

    let times = simulation::time_grid(config.t_end, config.dt)?;
    let trajectory = Trajectory::analytic(times, config.initial.a, &config.kinetics);

    Ok(SimulationResponse {
        config: config.clone(),
        summary: RunSummary::from_trajectory(&trajectory),
        trajectory,
    })
}

/// Simulate, then measure the deviation from the closed-form solution
pub fn compare(config: &RunConfig) -> Result<ComparisonResponse> {
    let SimulationResponse {
        config,
        summary,
        trajectory,
    } = run_simulation(config)?;

    let comparison = simulation::compare_with_analytic(&trajectory, &config.kinetics)?;
    log::info!(
        "Max deviation from analytic solution: {:e}",
        comparison.max_abs_error()
    );

    Ok(ComparisonResponse {
        config,
        summary,
        comparison,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimulationError;
    use crate::kinetics::{KineticParams, Species};
    use approx::assert_relative_eq;

    #[test]
    fn test_run_simulation_default() {
        let response = run_simulation(&RunConfig::default()).unwrap();
        assert_eq!(response.summary.steps, 1000);
        assert_eq!(response.trajectory.len(), 1001);
        assert_relative_eq!(response.summary.initial_mass, 1.0);
        assert!(response.summary.max_mass_drift <= 1e-9);
    }

    #[test]
    fn test_run_simulation_propagates_check_failure() {
        let config = RunConfig {
            dt: 0.025,
            ..RunConfig::default()
        };
        let err = run_simulation(&config).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidState { step: 1, .. }));
    }

    #[test]
    fn test_analytic_profile() {
        let config = RunConfig {
            t_end: 1.0,
            dt: 0.01,
            kinetics: KineticParams::new(2.0, 1.0),
            ..RunConfig::default()
        };
        let response = analytic_profile(&config).unwrap();
        assert_eq!(response.trajectory.len(), 101);
        let final_a = response.trajectory.column(Species::A)[100];
        assert_relative_eq!(final_a, (-2.0f64).exp(), epsilon = 1e-9);
    }

    #[test]
    fn test_compare_default() {
        let response = compare(&RunConfig::default()).unwrap();
        assert!(response.comparison.max_abs_error() < 1e-2);
        assert_eq!(response.summary.steps, 1000);
    }

    #[test]
    fn test_compare_rejects_nonzero_c0() {
        let config = RunConfig {
            initial: Concentrations::new(1.0, 0.0, 0.2),
            ..RunConfig::default()
        };
        assert!(matches!(
            compare(&config).unwrap_err(),
            SimulationError::InvalidInput(_)
        ));
    }
}
