//! Trajectory simulation for A -> B -> C
//!
//! Fixed-step explicit Euler over a uniform time grid, with optional
//! fail-fast checks for negative concentrations and mass drift. The
//! closed-form solutions can be laid out on the same grid for comparison.

use ndarray::{aview1, Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Result, SimulationError};
use crate::kinetics::{self, constants::NUM_SPECIES, Concentrations, KineticParams, Species};

/// Longest grid a single run may allocate (about 3.2 GB of concentrations)
pub const MAX_STEPS: usize = 100_000_000;

/// Thresholds used by the per-step checks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationThresholds {
    /// Allowed absolute drift of A+B+C from its initial value
    pub tol_mass: f64,
    /// How far below zero a concentration may go before it is invalid
    pub tol_neg: f64,
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        Self {
            tol_mass: 1e-9,
            tol_neg: 1e-12,
        }
    }
}

impl ValidationThresholds {
    /// Check one state against both thresholds
    ///
    /// # Arguments
    /// * `step` - Index of the state on the time grid
    /// * `time` - Time of the state [s]
    /// * `state` - Concentrations to check
    /// * `initial_total` - A+B+C of the initial state
    pub fn check(
        &self,
        step: usize,
        time: f64,
        state: &Concentrations,
        initial_total: f64,
    ) -> Result<()> {
        if let Some((species, value)) = state.first_below(-self.tol_neg) {
            return Err(SimulationError::InvalidState {
                step,
                time,
                species,
                value,
                tol_neg: self.tol_neg,
            });
        }

        let drift = (state.total() - initial_total).abs();
        // Negated comparison so a NaN total counts as drift
        if !(drift <= self.tol_mass) {
            return Err(SimulationError::MassDrift {
                step,
                time,
                drift,
                tol_mass: self.tol_mass,
            });
        }

        Ok(())
    }
}

/// Number of Euler steps needed to reach `t_end`
///
/// The smallest `N` with `N as f64 * dt >= t_end`, evaluated the same way the
/// grid is built, so `t_end = 0.1, dt = 1e-4` gives 1000 steps rather than 1001
/// and the last grid point is never short of `t_end`.
pub fn step_count(t_end: f64, dt: f64) -> Result<usize> {
    if !dt.is_finite() || dt <= 0.0 {
        return Err(SimulationError::InvalidInput(format!(
            "time step must be positive and finite, got {dt}"
        )));
    }
    if !t_end.is_finite() || t_end < 0.0 {
        return Err(SimulationError::InvalidInput(format!(
            "end time must be non-negative and finite, got {t_end}"
        )));
    }

    let mut steps = (t_end / dt).ceil();
    if !(steps <= MAX_STEPS as f64) {
        return Err(SimulationError::InvalidInput(format!(
            "{t_end} s at dt = {dt} s needs more than {MAX_STEPS} steps"
        )));
    }

    while steps > 0.0 && (steps - 1.0) * dt >= t_end {
        steps -= 1.0;
    }
    while steps * dt < t_end {
        steps += 1.0;
    }

    let steps = steps as usize;
    if steps > MAX_STEPS {
        return Err(SimulationError::InvalidInput(format!(
            "{t_end} s at dt = {dt} s needs more than {MAX_STEPS} steps"
        )));
    }

    Ok(steps)
}

/// Uniform grid `0, dt, ..., N*dt` with `N = step_count(t_end, dt)`
pub fn time_grid(t_end: f64, dt: f64) -> Result<Array1<f64>> {
    let steps = step_count(t_end, dt)?;
    Ok(Array1::from_shape_fn(steps + 1, |i| i as f64 * dt))
}

/// One row of a trajectory
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TrajectoryPoint {
    pub t: f64,
    #[serde(rename = "A")]
    pub a: f64,
    #[serde(rename = "B")]
    pub b: f64,
    #[serde(rename = "C")]
    pub c: f64,
}

/// Time points and concentrations (rows = time points, columns = [A, B, C])
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    times: Array1<f64>,
    states: Array2<f64>,
}

impl Trajectory {
    /// Closed-form A, B and C on `times`, starting from `a0` with B0 = C0 = 0
    pub fn analytic(times: Array1<f64>, a0: f64, params: &KineticParams) -> Self {
        let columns = [
            kinetics::analytic_a(times.view(), a0, params.k1),
            kinetics::analytic_b(times.view(), a0, params.k1, params.k2),
            kinetics::analytic_c(times.view(), a0, params.k1, params.k2),
        ];

        let mut states = Array2::zeros((times.len(), NUM_SPECIES));
        for (mut column, values) in states.axis_iter_mut(Axis(1)).zip(columns.iter()) {
            column.assign(values);
        }

        Self { times, states }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> ArrayView1<'_, f64> {
        self.times.view()
    }

    pub fn states(&self) -> ArrayView2<'_, f64> {
        self.states.view()
    }

    /// Concentration of one species over time
    pub fn column(&self, species: Species) -> ArrayView1<'_, f64> {
        self.states.column(species.index())
    }

    pub fn state_at(&self, index: usize) -> Option<Concentrations> {
        (index < self.len()).then(|| Concentrations::from_row(self.states.row(index)))
    }

    pub fn initial_state(&self) -> Option<Concentrations> {
        self.state_at(0)
    }

    pub fn final_state(&self) -> Option<Concentrations> {
        self.len().checked_sub(1).and_then(|last| self.state_at(last))
    }

    pub fn final_time(&self) -> f64 {
        self.len()
            .checked_sub(1)
            .map_or(0.0, |last| self.times[last])
    }

    /// A+B+C at every time point
    pub fn total_mass(&self) -> Array1<f64> {
        self.states.sum_axis(Axis(1))
    }

    /// Largest |total(t) - total(0)| over the trajectory
    pub fn max_mass_drift(&self) -> f64 {
        let totals = self.total_mass();
        let Some(&initial) = totals.get(0) else {
            return 0.0;
        };
        totals
            .iter()
            .map(|total| (total - initial).abs())
            .fold(0.0, f64::max)
    }

    /// Smallest concentration of any species at any time
    pub fn min_concentration(&self) -> f64 {
        self.states.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn points(&self) -> impl Iterator<Item = TrajectoryPoint> + '_ {
        self.times
            .iter()
            .zip(self.states.rows())
            .map(|(&t, row)| TrajectoryPoint {
                t,
                a: row[0],
                b: row[1],
                c: row[2],
            })
    }

    /// Clamp negative concentrations to zero; NaN is left alone
    fn clip_negative(&mut self) {
        self.states.mapv_inplace(|v| if v < 0.0 { 0.0 } else { v });
    }
}

impl Serialize for Trajectory {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.points())
    }
}

/// Euler integrator for A -> B -> C
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ReactionSimulator {
    pub params: KineticParams,
    pub thresholds: ValidationThresholds,
    /// Run the per-step checks
    pub checks: bool,
    /// Clamp negatives in the returned trajectory (integration is unaffected)
    pub clip_negative: bool,
}

impl Default for ReactionSimulator {
    fn default() -> Self {
        Self::new(KineticParams::default())
    }
}

impl ReactionSimulator {
    pub fn new(params: KineticParams) -> Self {
        Self {
            params,
            thresholds: ValidationThresholds::default(),
            checks: true,
            clip_negative: false,
        }
    }

    pub fn with_thresholds(mut self, thresholds: ValidationThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_checks(mut self, checks: bool) -> Self {
        self.checks = checks;
        self
    }

    pub fn with_clip_negative(mut self, clip_negative: bool) -> Self {
        self.clip_negative = clip_negative;
        self
    }

    /// Integrate from `initial` over `[0, t_end]` with step `dt`
    ///
    /// With checks enabled the initial state and every new state are
    /// validated and the first violation aborts the run.
    pub fn run(&self, initial: Concentrations, t_end: f64, dt: f64) -> Result<Trajectory> {
        let times = time_grid(t_end, dt)?;
        let initial_total = initial.total();

        if self.checks {
            self.thresholds.check(0, 0.0, &initial, initial_total)?;
        }

        let mut states = Array2::zeros((times.len(), NUM_SPECIES));
        let mut current = initial;
        for (step, mut row) in states.axis_iter_mut(Axis(0)).enumerate() {
            if step > 0 {
                current = kinetics::euler_step(&current, &self.params, dt);
                if self.checks {
                    self.thresholds
                        .check(step, times[step], &current, initial_total)?;
                }
            }
            row.assign(&aview1(&current.to_array()));
        }

        let mut trajectory = Trajectory { times, states };
        if self.clip_negative {
            trajectory.clip_negative();
        }

        Ok(trajectory)
    }
}

/// Run one simulation with explicit arguments
pub fn simulate(
    initial: Concentrations,
    t_end: f64,
    dt: f64,
    params: &KineticParams,
    thresholds: &ValidationThresholds,
    checks: bool,
    clip_negative: bool,
) -> Result<Trajectory> {
    ReactionSimulator::new(*params)
        .with_thresholds(*thresholds)
        .with_checks(checks)
        .with_clip_negative(clip_negative)
        .run(initial, t_end, dt)
}

// ============================================================================
// Comparison against the closed-form solution
// ============================================================================

/// Worst deviation of one species from its analytic curve
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SpeciesError {
    pub species: Species,
    pub max_abs_error: f64,
    /// Time at which the worst deviation occurs [s]
    pub at_time: f64,
}

/// Simulated vs analytic, per species
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyticComparison {
    pub a0: f64,
    pub species: Vec<SpeciesError>,
}

impl AnalyticComparison {
    /// Largest error over all species
    pub fn max_abs_error(&self) -> f64 {
        self.species
            .iter()
            .map(|e| e.max_abs_error)
            .fold(0.0, f64::max)
    }

    pub fn for_species(&self, species: Species) -> Option<&SpeciesError> {
        self.species.iter().find(|e| e.species == species)
    }
}

/// Compare a simulated trajectory with the analytic solution on its own grid
///
/// Only valid when the trajectory starts with B0 = C0 = 0.
pub fn compare_with_analytic(
    trajectory: &Trajectory,
    params: &KineticParams,
) -> Result<AnalyticComparison> {
    let initial = trajectory
        .initial_state()
        .ok_or_else(|| SimulationError::InvalidInput("trajectory is empty".to_string()))?;
    if initial.b != 0.0 || initial.c != 0.0 {
        return Err(SimulationError::InvalidInput(format!(
            "analytic solution assumes B0 = C0 = 0, got B0 = {}, C0 = {}",
            initial.b, initial.c
        )));
    }

    let reference = Trajectory::analytic(trajectory.times.clone(), initial.a, params);

    let species = Species::ALL
        .iter()
        .map(|&s| {
            let (index, max_abs_error) = trajectory
                .column(s)
                .iter()
                .zip(reference.column(s).iter())
                .map(|(sim, exact)| (sim - exact).abs())
                .enumerate()
                .fold((0, 0.0_f64), |best, (i, err)| {
                    if err > best.1 || err.is_nan() {
                        (i, err)
                    } else {
                        best
                    }
                });
            SpeciesError {
                species: s,
                max_abs_error,
                at_time: trajectory.times[index],
            }
        })
        .collect();

    Ok(AnalyticComparison {
        a0: initial.a,
        species,
    })
}
