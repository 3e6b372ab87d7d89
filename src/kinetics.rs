//! Rate laws for the sequential reaction A -> B -> C
//!
//! This module holds the pure math: the right-hand side of the ODE system,
//! the explicit Euler update and the closed-form reference solutions.
//! Nothing here knows about validation thresholds.

use std::fmt;

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// Default rate constants
pub mod constants {
    pub const DEFAULT_K1_PER_S: f64 = 100.0;
    pub const DEFAULT_K2_PER_S: f64 = 0.1;
    pub const NUM_SPECIES: usize = 3;
}

/// One of the three species in the network
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Species {
    A,
    B,
    C,
}

impl Species {
    pub const ALL: [Species; constants::NUM_SPECIES] = [Species::A, Species::B, Species::C];

    /// Column index in a trajectory's concentration array
    pub fn index(self) -> usize {
        match self {
            Species::A => 0,
            Species::B => 1,
            Species::C => 2,
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Species::A => "A",
            Species::B => "B",
            Species::C => "C",
        };
        f.write_str(name)
    }
}

/// Concentrations of A, B and C at one instant [µM or arbitrary units]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Concentrations {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Default for Concentrations {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
        }
    }
}

impl Concentrations {
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    pub fn get(&self, species: Species) -> f64 {
        match species {
            Species::A => self.a,
            Species::B => self.b,
            Species::C => self.c,
        }
    }

    /// Total mass A + B + C
    pub fn total(&self) -> f64 {
        self.a + self.b + self.c
    }

    pub fn to_array(self) -> [f64; constants::NUM_SPECIES] {
        [self.a, self.b, self.c]
    }

    /// Build from a row of a concentration array; missing entries read as zero.
    pub fn from_row(row: ArrayView1<f64>) -> Self {
        let at = |i: usize| row.get(i).copied().unwrap_or(0.0);
        Self::new(at(0), at(1), at(2))
    }

    /// First species whose concentration is below `floor`, if any
    pub fn first_below(&self, floor: f64) -> Option<(Species, f64)> {
        Species::ALL
            .iter()
            .map(|&s| (s, self.get(s)))
            .find(|&(_, value)| value < floor)
    }
}

/// First-order rate constants [1/s]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct KineticParams {
    /// A -> B
    pub k1: f64,
    /// B -> C
    pub k2: f64,
}

impl Default for KineticParams {
    fn default() -> Self {
        Self {
            k1: constants::DEFAULT_K1_PER_S,
            k2: constants::DEFAULT_K2_PER_S,
        }
    }
}

impl KineticParams {
    pub fn new(k1: f64, k2: f64) -> Self {
        Self { k1, k2 }
    }
}

/// Instantaneous rates [dA/dt, dB/dt, dC/dt]
///
/// ```text
/// dA/dt = -k1*A
/// dB/dt =  k1*A - k2*B
/// dC/dt =  k2*B
/// ```
///
/// Negative inputs are accepted; deciding whether a state is physical is the
/// caller's job.
pub fn derivative(state: &Concentrations, params: &KineticParams) -> Concentrations {
    let a_to_b = params.k1 * state.a;
    let b_to_c = params.k2 * state.b;

    Concentrations {
        a: -a_to_b,
        b: a_to_b - b_to_c,
        c: b_to_c,
    }
}

/// Advance the state by one explicit (forward) Euler step
///
/// # Arguments
/// * `state` - Current concentrations
/// * `params` - Rate constants
/// * `dt` - Time step [s]
///
/// # Returns
/// Concentrations after `dt` seconds, `state + derivative(state) * dt`
pub fn euler_step(state: &Concentrations, params: &KineticParams, dt: f64) -> Concentrations {
    let rates = derivative(state, params);

    Concentrations {
        a: state.a + rates.a * dt,
        b: state.b + rates.b * dt,
        c: state.c + rates.c * dt,
    }
}

// ============================================================================
// Closed-form solutions (B0 = C0 = 0)
// ============================================================================

/// A(t) = A0 * exp(-k1*t)
pub fn analytic_a(times: ArrayView1<f64>, a0: f64, k1: f64) -> Array1<f64> {
    times.mapv(|t| a0 * (-k1 * t).exp())
}

/// B(t) = A0 * k1/(k2-k1) * (exp(-k1*t) - exp(-k2*t))
///
/// Not defined for `k1 == k2`: the result is NaN rather than the limiting form.
pub fn analytic_b(times: ArrayView1<f64>, a0: f64, k1: f64, k2: f64) -> Array1<f64> {
    times.mapv(|t| a0 * (k1 / (k2 - k1)) * ((-k1 * t).exp() - (-k2 * t).exp()))
}

/// C(t) = A0 * (1 - k2/(k2-k1) * exp(-k1*t) - k1/(k1-k2) * exp(-k2*t))
///
/// Not defined for `k1 == k2`: the result is non-finite.
pub fn analytic_c(times: ArrayView1<f64>, a0: f64, k1: f64, k2: f64) -> Array1<f64> {
    times.mapv(|t| {
        a0 * (1.0 - (k2 / (k2 - k1)) * (-k1 * t).exp() - (k1 / (k1 - k2)) * (-k2 * t).exp())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_derivative_unit_rates() {
        let rates = derivative(&Concentrations::new(1.0, 0.0, 0.0), &KineticParams::new(1.0, 1.0));
        assert_eq!(rates, Concentrations::new(-1.0, 1.0, 0.0));
    }

    #[test]
    fn test_derivative_conserves_mass() {
        let state = Concentrations::new(0.3, 0.5, 0.2);
        let rates = derivative(&state, &KineticParams::new(7.0, 0.25));
        assert_relative_eq!(rates.total(), 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_derivative_accepts_negative_state() {
        let rates = derivative(&Concentrations::new(-1.0, 0.0, 0.0), &KineticParams::new(2.0, 1.0));
        assert_eq!(rates, Concentrations::new(2.0, -2.0, 0.0));
    }

    #[test]
    fn test_euler_step() {
        let next = euler_step(
            &Concentrations::new(1.0, 0.0, 0.0),
            &KineticParams::new(100.0, 0.1),
            1e-3,
        );
        assert_relative_eq!(next.a, 0.9, epsilon = 1e-12);
        assert_relative_eq!(next.b, 0.1, epsilon = 1e-12);
        assert_eq!(next.c, 0.0);
    }

    #[test]
    fn test_analytic_initial_values() {
        let t = array![0.0];
        assert_relative_eq!(analytic_a(t.view(), 2.0, 5.0)[0], 2.0);
        assert_relative_eq!(analytic_b(t.view(), 2.0, 5.0, 0.5)[0], 0.0);
        assert_relative_eq!(analytic_c(t.view(), 2.0, 5.0, 0.5)[0], 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_analytic_mass_balance() {
        let t = array![0.0, 0.01, 0.1, 1.0, 10.0];
        let (a0, k1, k2) = (1.5, 100.0, 0.1);
        let a = analytic_a(t.view(), a0, k1);
        let b = analytic_b(t.view(), a0, k1, k2);
        let c = analytic_c(t.view(), a0, k1, k2);
        for i in 0..t.len() {
            assert_relative_eq!(a[i] + b[i] + c[i], a0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_analytic_equal_rates_degenerate() {
        let t = array![0.0, 0.5, 1.0];
        let b = analytic_b(t.view(), 1.0, 2.0, 2.0);
        let c = analytic_c(t.view(), 1.0, 2.0, 2.0);
        assert!(b.iter().all(|v| !v.is_finite()));
        assert!(c.iter().all(|v| !v.is_finite()));
    }

    #[test]
    fn test_first_below() {
        let state = Concentrations::new(0.5, -1e-3, -2.0);
        assert_eq!(state.first_below(-1e-12), Some((Species::B, -1e-3)));
        assert_eq!(state.first_below(-5.0), None);
    }
}
